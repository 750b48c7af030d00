//! On-demand camera framing of the visible content.

use super::viewport_camera::ViewportCamera;
use crate::engine::assets::bounds::BoundsData;
use crate::engine::scene::anatomy::AnatomyMesh;
use crate::engine::scene::composer::ComposedContent;
use crate::engine::scene::normalization::SceneNormalization;
use crate::tools::picking::hit_test::PickShape;
use bevy::math::Affine3A;
use bevy::render::mesh::MeshAabb;
use bevy::prelude::*;
use constants::render_settings::{FRAME_DISTANCE_FACTOR, FRAME_FAR_FACTOR, FRAME_NEAR_FACTOR};

/// Request to frame everything currently visible.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct FrameView;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub target: Vec3,
    pub position: Vec3,
    pub distance: f32,
    pub near: f32,
    pub far: f32,
}

/// Orbit target at the box centre, camera `FRAME_DISTANCE_FACTOR` times the
/// largest dimension away along `view_back`, clip planes proportional.
pub fn compute_framing(bounds: &BoundsData, view_back: Vec3) -> Framing {
    let max_dimension = if bounds.is_degenerate() {
        1.0
    } else {
        bounds.max_dimension()
    };
    let distance = FRAME_DISTANCE_FACTOR * max_dimension;
    let direction = view_back.try_normalize().unwrap_or(Vec3::Z);
    let target = bounds.center();

    Framing {
        target,
        position: target + direction * distance,
        distance,
        near: distance * FRAME_NEAR_FACTOR,
        far: distance * FRAME_FAR_FACTOR,
    }
}

/// Union of per-primitive local bounds mapped to world space.
pub fn visible_bounds(items: impl IntoIterator<Item = (Affine3A, BoundsData)>) -> Option<BoundsData> {
    items
        .into_iter()
        .map(|(affine, local)| local.transformed(&affine))
        .reduce(|a, b| a.union(&b))
}

fn local_bounds(mesh: Option<&Mesh>, shape: Option<&PickShape>) -> Option<BoundsData> {
    match shape {
        Some(PickShape::Sphere { center, radius }) => {
            let extent = Vec3::splat(*radius);
            return Some(BoundsData::new(*center - extent, *center + extent));
        }
        Some(PickShape::Segments(segments)) => {
            return BoundsData::from_points(segments.iter().flatten().copied());
        }
        _ => {}
    }
    mesh.and_then(Mesh::compute_aabb).map(|aabb| BoundsData::from_aabb(&aabb))
}

/// Queue a framing pass whenever a fresh normalization lands.
pub fn frame_on_normalization(
    normalization: Res<SceneNormalization>,
    mut frame: EventWriter<FrameView>,
) {
    if normalization.is_changed() && normalization.transform.is_some() {
        frame.write(FrameView);
    }
}

/// Runs after transform and visibility propagation so freshly composed
/// content is measured where it will be drawn.
pub fn frame_view(
    mut events: EventReader<FrameView>,
    content: Query<
        (&GlobalTransform, &InheritedVisibility, Option<&Mesh3d>, Option<&PickShape>),
        Or<(With<ComposedContent>, With<AnatomyMesh>)>,
    >,
    meshes: Res<Assets<Mesh>>,
    mut orbit: ResMut<ViewportCamera>,
    mut projections: Query<&mut Projection, With<Camera3d>>,
) {
    if events.is_empty() {
        return;
    }
    events.clear();

    let items = content
        .iter()
        .filter(|(_, visibility, _, _)| visibility.get())
        .filter_map(|(transform, _, mesh, shape)| {
            let mesh = mesh.and_then(|m| meshes.get(&m.0));
            local_bounds(mesh, shape).map(|bounds| (transform.affine(), bounds))
        });

    let Some(bounds) = visible_bounds(items) else {
        debug!("Frame view skipped: nothing visible");
        return;
    };

    let framing = compute_framing(&bounds, orbit.back());
    orbit.focus_point = framing.target;
    orbit.distance = framing.distance;
    orbit.min_distance = framing.near * 2.0;
    orbit.max_distance = framing.far * 0.5;

    for mut projection in &mut projections {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.near = framing.near;
            perspective.far = framing.far;
        }
    }

    debug!(
        "Framed view on {:?} at distance {:.3} (near {:.4}, far {:.1})",
        framing.target, framing.distance, framing.near, framing.far
    );
}
