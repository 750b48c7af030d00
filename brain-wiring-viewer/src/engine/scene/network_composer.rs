//! Functional network overlays: one sphere per node, one line per edge.

use super::composer::{CompositionDirty, ComposedContent, SemanticLabel};
use super::lines::{LineAssets, LineGeometry, LineKind, LineRole, LineStyle, dash_segments};
use super::normalization::{NormalizedRoot, SceneNormalization};
use super::wide_line::{ViewportResolution, WideLineMaterial};
use crate::engine::assets::networks::NetworkCatalog;
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::params::ViewerParams;
use crate::engine::error::DataInconsistencyError;
use crate::tools::picking::hit_test::PickShape;
use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use constants::coordinate_system::ras_to_display;
use constants::render_settings::{DEFAULT_MODE_NETWORK_ID, EDGE_DASH_MM, EDGE_GAP_MM, GLOW_INTENSITY};
use std::collections::BTreeSet;

#[derive(Component, Debug, Clone)]
pub struct NetworkGroup {
    pub id: String,
}

/// Node sphere; keeps its colour for restyling.
#[derive(Component, Debug, Clone)]
pub struct NodePrimitive {
    pub color: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct NetworkStyle {
    pub node_size_mm: f32,
    pub dmn_boost: f32,
    pub dashed_edges: bool,
    pub line_kind: LineKind,
}

impl NetworkStyle {
    pub fn from_params(params: &ViewerParams, thin_threshold_px: f32) -> Self {
        Self {
            node_size_mm: params.node_size_mm,
            dmn_boost: params.dmn_boost,
            dashed_edges: params.dashed_edges,
            line_kind: LineKind::for_width(params.line_width_px, thin_threshold_px),
        }
    }

    /// Radius multiplier for a network; only the default-mode network is boosted.
    pub fn multiplier(&self, network_id: &str) -> f32 {
        if network_id == DEFAULT_MODE_NETWORK_ID {
            self.dmn_boost
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodePlan {
    pub id: String,
    pub position: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgePlan {
    pub from: String,
    pub to: String,
    pub segments: Vec<[Vec3; 2]>,
}

#[derive(Debug, Clone)]
pub struct NetworkPlan {
    pub id: String,
    pub name: String,
    pub color: Color,
    pub nodes: Vec<NodePlan>,
    pub edges: Vec<EdgePlan>,
}

/// Pure plan of the selected networks. Edges with an unknown endpoint are
/// left out and reported; the rest of the network is unaffected.
pub fn plan_networks(
    catalog: &NetworkCatalog,
    selected: &BTreeSet<String>,
    style: &NetworkStyle,
) -> (Vec<NetworkPlan>, Vec<DataInconsistencyError>) {
    let mut issues = Vec::new();
    let mut plans = Vec::new();

    for network in catalog.networks.iter().filter(|n| selected.contains(&n.id)) {
        let radius = style.node_size_mm * style.multiplier(&network.id);
        let nodes = network
            .nodes
            .iter()
            .map(|node| NodePlan {
                id: node.id.clone(),
                position: ras_to_display(node.position),
                radius,
            })
            .collect();

        let mut edges = Vec::new();
        for (from, to) in &network.edges {
            let (Some(a), Some(b)) = (network.node(from), network.node(to)) else {
                issues.push(DataInconsistencyError::UnknownEdgeEndpoint {
                    network: network.id.clone(),
                    from: from.clone(),
                    to: to.clone(),
                });
                continue;
            };
            let (a, b) = (ras_to_display(a.position), ras_to_display(b.position));
            let segments = if style.dashed_edges {
                dash_segments(a, b, EDGE_DASH_MM, EDGE_GAP_MM)
            } else {
                vec![[a, b]]
            };
            edges.push(EdgePlan {
                from: from.clone(),
                to: to.clone(),
                segments,
            });
        }

        plans.push(NetworkPlan {
            id: network.id.clone(),
            name: network.name.clone(),
            color: network.display_color(),
            nodes,
            edges,
        });
    }

    (plans, issues)
}

pub fn node_material(color: Color, opacity: f32, glow: bool) -> StandardMaterial {
    let mut material = StandardMaterial {
        base_color: color.with_alpha(opacity),
        alpha_mode: AlphaMode::Blend,
        perceptual_roughness: 0.4,
        ..default()
    };
    set_node_glow(&mut material, color, glow);
    material
}

pub fn set_node_glow(material: &mut StandardMaterial, color: Color, glow: bool) {
    material.emissive = if glow {
        color.to_linear() * GLOW_INTENSITY
    } else {
        color.to_linear() * 0.15
    };
}

/// Rebuild network overlays when marked dirty and a normalization exists.
#[allow(clippy::too_many_arguments)]
pub fn compose_networks(
    mut dirty: ResMut<CompositionDirty>,
    catalog: Option<Res<NetworkCatalog>>,
    params: Res<ViewerParams>,
    config: Res<ViewerConfig>,
    normalization: Res<SceneNormalization>,
    resolution: Res<ViewportResolution>,
    existing: Query<Entity, With<NetworkGroup>>,
    roots: Query<Entity, With<NormalizedRoot>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut standard: ResMut<Assets<StandardMaterial>>,
    mut wide: ResMut<Assets<WideLineMaterial>>,
    mut commands: Commands,
) {
    if !dirty.networks {
        return;
    }
    let Some(catalog) = catalog else {
        return;
    };
    if normalization.transform.is_none() {
        return;
    }
    let Ok(root) = roots.single() else {
        return;
    };
    dirty.networks = false;

    for entity in &existing {
        commands.entity(entity).despawn();
    }

    for id in &params.selected_networks {
        if catalog.get(id).is_none() {
            warn!("Selected network {} is not in the catalogue", id);
        }
    }

    let style = NetworkStyle::from_params(&params, config.thin_line_threshold_px);
    let (plans, issues) = plan_networks(&catalog, &params.selected_networks, &style);
    for issue in &issues {
        warn!("{}", issue);
    }

    let mut lines = LineAssets {
        meshes: &mut meshes,
        standard: &mut standard,
        wide: &mut wide,
        resolution: resolution.0,
    };

    for plan in &plans {
        let label = SemanticLabel(plan.name.clone());
        let group = commands
            .spawn((
                Name::new(format!("network:{}", plan.id)),
                NetworkGroup {
                    id: plan.id.clone(),
                },
                label.clone(),
                Transform::IDENTITY,
                Visibility::Inherited,
                ChildOf(root),
            ))
            .id();

        let material = lines
            .standard
            .add(node_material(plan.color, params.functional_opacity, params.glow));
        for node in &plan.nodes {
            let mesh = lines.meshes.add(Sphere::new(node.radius).mesh().ico(3).unwrap_or_else(
                |_| Sphere::new(node.radius).mesh().uv(24, 16),
            ));
            commands.spawn((
                Name::new(format!("node:{}:{}", plan.id, node.id)),
                NodePrimitive { color: plan.color },
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(node.position),
                Visibility::Inherited,
                NotShadowCaster,
                PickShape::Sphere {
                    center: Vec3::ZERO,
                    radius: node.radius,
                },
                label.clone(),
                ComposedContent,
                ChildOf(group),
            ));
        }

        let line_style = LineStyle {
            kind: style.line_kind,
            role: LineRole::Network,
            color: plan.color,
            opacity: params.functional_opacity,
            width_px: params.line_width_px,
            glow: params.glow,
        };
        for edge in &plan.edges {
            lines.spawn_line(
                &mut commands,
                LineGeometry::Segments(edge.segments.clone()),
                &line_style,
                (label.clone(), ComposedContent, ChildOf(group)),
            );
        }
    }

    debug!("Composed {} functional networks", plans.len());
}
