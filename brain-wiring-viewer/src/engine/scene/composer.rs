//! Bundle composition under the normalized root.
//!
//! Composition is discard-and-rebuild: every pass despawns the previous
//! bundle groups and spawns fresh ones from the pure plan produced by
//! `plan_bundles`. Surfaces and wiring are both built whenever a source
//! exists; render mode only toggles their visibility.

use super::lines::{LineAssets, LineGeometry, LineKind, LineRole, LineStyle};
use super::normalization::{NormalizationTransform, NormalizedRoot, SceneNormalization};
use super::wide_line::{ViewportResolution, WideLineMaterial};
use crate::engine::assets::bundle_payload::BundlePayload;
use crate::engine::assets::location::mesh_asset_path;
use crate::engine::assets::pack_manifest::{PackManifest, WiringSpace};
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::params::ViewerParams;
use crate::engine::error::DataInconsistencyError;
use crate::engine::loading::pack_session::PackSession;
use crate::engine::systems::render_mode::RenderMode;
use crate::tools::picking::hit_test::PickShape;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;
use constants::coordinate_system::ras_to_display;
use std::collections::{BTreeMap, BTreeSet};

/// Pending recomposition, set by loaders and parameter changes.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompositionDirty {
    pub bundles: bool,
    pub networks: bool,
}

/// Human-readable name shown in the tooltip for anything under a group.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct SemanticLabel(pub String);

/// Anything produced by composition; candidates for picking and framing.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ComposedContent;

#[derive(Component, Debug, Clone)]
pub struct BundleGroup {
    pub id: String,
}

/// Surface sub-object of a bundle.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct BundleSurface;

/// Wiring sub-object of a bundle, parent of one line per polyline.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct BundleWiring;

/// Mesh inside a bundle surface scene.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct SurfacePrimitive;

/// Style inputs shared by every bundle in one pass.
#[derive(Debug, Clone, Copy)]
pub struct BundleStyle {
    pub line_width_px: f32,
    pub opacity: f32,
    pub glow: bool,
    pub thin_threshold_px: f32,
}

impl BundleStyle {
    pub fn from_params(params: &ViewerParams, thin_threshold_px: f32) -> Self {
        Self {
            line_width_px: params.line_width_px,
            opacity: params.bundle_opacity,
            glow: params.glow,
            thin_threshold_px,
        }
    }

    pub fn line_kind(&self) -> LineKind {
        LineKind::for_width(self.line_width_px, self.thin_threshold_px)
    }
}

/// Everything needed to spawn one bundle group.
#[derive(Debug, Clone)]
pub struct BundlePlan {
    pub id: String,
    pub name: String,
    pub color: Color,
    /// Asset path of the surface scene
    pub surface_path: Option<String>,
    /// Polylines in anatomy-local display coordinates
    pub wiring: Vec<Vec<Vec3>>,
    pub line_kind: LineKind,
    pub issues: Vec<DataInconsistencyError>,
}

impl BundlePlan {
    /// Wiring primitives that end up visible under `mode`.
    pub fn visible_wiring_primitives(&self, mode: RenderMode) -> usize {
        if mode.shows_wiring() { self.wiring.len() } else { 0 }
    }

    pub fn visible_surfaces(&self, mode: RenderMode) -> usize {
        usize::from(mode.shows_surface() && self.surface_path.is_some())
    }
}

/// Map an authored wiring point into the normalized root's local frame.
pub fn wiring_point_to_local(
    point: [f32; 3],
    space: WiringSpace,
    normalization: &NormalizationTransform,
) -> Vec3 {
    let display = ras_to_display(point);
    match space {
        WiringSpace::WorldMm => display,
        WiringSpace::Normalized => normalization.denormalize(display),
    }
}

/// Pure plan of the bundle groups for the enabled set, in manifest order.
pub fn plan_bundles(
    manifest: &PackManifest,
    payloads: &BTreeMap<String, BundlePayload>,
    enabled: &BTreeSet<String>,
    pack_root: &str,
    style: &BundleStyle,
    normalization: &NormalizationTransform,
) -> Vec<BundlePlan> {
    manifest
        .bundles
        .iter()
        .filter(|bundle| enabled.contains(&bundle.id))
        .map(|bundle| {
            let mut issues = Vec::new();
            let surface_path = bundle
                .sources
                .mesh_url()
                .map(|mesh| mesh_asset_path(pack_root, mesh));

            let wiring = match bundle.sources.wire_url().and_then(|_| payloads.get(&bundle.id)) {
                Some(payload) => {
                    if manifest.wiring_space == WiringSpace::Normalized
                        && !payload.within_normalized_cube()
                    {
                        issues.push(DataInconsistencyError::OutOfNormalizedRange {
                            bundle: bundle.id.clone(),
                        });
                    }
                    let (lines, skipped) = payload.renderable_lines();
                    issues.extend(skipped);
                    lines
                        .into_iter()
                        .map(|line| {
                            line.iter()
                                .map(|p| wiring_point_to_local(*p, manifest.wiring_space, normalization))
                                .collect()
                        })
                        .collect()
                }
                None => Vec::new(),
            };

            BundlePlan {
                id: bundle.id.clone(),
                name: bundle.name.clone(),
                color: bundle.color,
                surface_path,
                wiring,
                line_kind: style.line_kind(),
                issues,
            }
        })
        .collect()
}

/// Rebuild bundle groups when marked dirty and normalization is in place.
#[allow(clippy::too_many_arguments)]
pub fn compose_bundles(
    mut dirty: ResMut<CompositionDirty>,
    session: Res<PackSession>,
    params: Res<ViewerParams>,
    config: Res<ViewerConfig>,
    normalization: Res<SceneNormalization>,
    resolution: Res<ViewportResolution>,
    asset_server: Res<AssetServer>,
    existing: Query<Entity, With<BundleGroup>>,
    roots: Query<Entity, With<NormalizedRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut standard: ResMut<Assets<StandardMaterial>>,
    mut wide: ResMut<Assets<WideLineMaterial>>,
    mut commands: Commands,
) {
    if !dirty.bundles {
        return;
    }
    let Some(manifest) = session.manifest() else {
        dirty.bundles = false;
        return;
    };
    // Bundles wait for the anatomy of the same load.
    let Some(transform) = normalization.ready_for(session.manifest_generation()) else {
        return;
    };
    let Ok(root) = roots.single() else {
        return;
    };
    dirty.bundles = false;

    for entity in &existing {
        commands.entity(entity).despawn();
    }

    let style = BundleStyle::from_params(&params, config.thin_line_threshold_px);
    let plans = plan_bundles(
        manifest,
        session.payloads(),
        &params.enabled_bundles,
        session.loaded_root(),
        &style,
        &transform,
    );

    let mut lines = LineAssets {
        meshes: &mut meshes,
        standard: &mut standard,
        wide: &mut wide,
        resolution: resolution.0,
    };

    let mut primitives = 0;
    for plan in &plans {
        for issue in &plan.issues {
            warn!("{}", issue);
        }
        primitives += spawn_bundle_group(&mut commands, root, plan, &style, &mut lines, &asset_server);
    }

    debug!(
        "Composed {} bundle groups with {} wiring primitives ({:?})",
        plans.len(),
        primitives,
        style.line_kind()
    );
}

fn spawn_bundle_group(
    commands: &mut Commands,
    root: Entity,
    plan: &BundlePlan,
    style: &BundleStyle,
    lines: &mut LineAssets<'_>,
    asset_server: &AssetServer,
) -> usize {
    let label = SemanticLabel(plan.name.clone());
    let group = commands
        .spawn((
            Name::new(format!("bundle:{}", plan.id)),
            BundleGroup {
                id: plan.id.clone(),
            },
            label.clone(),
            Transform::IDENTITY,
            Visibility::Inherited,
            ChildOf(root),
        ))
        .id();

    if let Some(path) = &plan.surface_path {
        let scene = asset_server.load(GltfAssetLabel::Scene(0).from_asset(path.clone()));
        commands
            .spawn((
                BundleSurface,
                label.clone(),
                SceneRoot(scene),
                Transform::IDENTITY,
                Visibility::Inherited,
                ChildOf(group),
            ))
            .observe(label_surface_meshes);
    }

    if plan.wiring.is_empty() {
        return 0;
    }

    let wiring = commands
        .spawn((
            BundleWiring,
            label.clone(),
            Transform::IDENTITY,
            Visibility::Inherited,
            ChildOf(group),
        ))
        .id();

    let line_style = LineStyle {
        kind: plan.line_kind,
        role: LineRole::Bundle,
        color: plan.color,
        opacity: style.opacity,
        width_px: style.line_width_px,
        glow: style.glow,
    };
    for polyline in &plan.wiring {
        lines.spawn_line(
            commands,
            LineGeometry::Polyline(polyline.clone()),
            &line_style,
            (label.clone(), ComposedContent, ChildOf(wiring)),
        );
    }
    plan.wiring.len()
}

/// Copy the surface label onto every mesh of an instanced surface scene.
pub fn label_surface_meshes(
    trigger: Trigger<SceneInstanceReady>,
    labels: Query<&SemanticLabel>,
    children: Query<&Children>,
    meshes: Query<(), With<Mesh3d>>,
    mut commands: Commands,
) {
    let surface = trigger.target();
    let Ok(label) = labels.get(surface) else {
        return;
    };
    for entity in children.iter_descendants(surface) {
        if meshes.contains(entity) {
            commands.entity(entity).insert((
                label.clone(),
                SurfacePrimitive,
                ComposedContent,
                PickShape::Mesh,
            ));
        }
    }
}
