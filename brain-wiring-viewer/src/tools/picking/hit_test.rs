//! Nearest-hit picking over composed primitives.
//!
//! Every pointer move rebuilds the ray and tests every visible candidate;
//! nothing is cached between moves. Lines are hit within a pixel tolerance
//! converted to world units at the hit distance, nodes as spheres and
//! surfaces triangle by triangle.

use super::ray::{
    PickRay, ndc_to_ray, pointer_to_ndc, ray_aabb_hit_t, ray_segment_distance, ray_sphere_hit,
    ray_triangle_hit,
};
use crate::engine::core::config::ViewerConfig;
use crate::engine::scene::composer::{ComposedContent, SemanticLabel};
use bevy::math::Affine3A;
use bevy::render::mesh::MeshAabb;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::window::PrimaryWindow;

/// Pickable geometry in the entity's local space.
#[derive(Component, Debug, Clone, PartialEq)]
pub enum PickShape {
    Segments(Vec<[Vec3; 2]>),
    Sphere { center: Vec3, radius: f32 },
    /// Triangles of the entity's own `Mesh3d`.
    Mesh,
}

/// Label under the pointer, if any, and where the pointer is.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct HoverState {
    pub label: Option<String>,
    pub pointer: Option<Vec2>,
}

pub struct PickCandidate<'a> {
    pub entity: Entity,
    pub shape: &'a PickShape,
    pub world_from_local: Affine3A,
    pub mesh: Option<&'a Mesh>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub entity: Entity,
    pub distance: f32,
}

/// Pixel tolerance expressed in world units along the ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineTolerance {
    pub pixels: f32,
    /// World size of one pixel regardless of depth (orthographic)
    pub per_pixel: f32,
    /// World size of one pixel per unit of ray distance (perspective)
    pub per_pixel_per_distance: f32,
}

impl LineTolerance {
    pub fn perspective(pixels: f32, fov_y: f32, viewport_height: f32) -> Self {
        Self {
            pixels,
            per_pixel: 0.0,
            per_pixel_per_distance: 2.0 * (fov_y * 0.5).tan() / viewport_height.max(1.0),
        }
    }

    pub fn orthographic(pixels: f32, view_height: f32, viewport_height: f32) -> Self {
        Self {
            pixels,
            per_pixel: view_height / viewport_height.max(1.0),
            per_pixel_per_distance: 0.0,
        }
    }

    pub fn at(&self, distance: f32) -> f32 {
        self.pixels * (self.per_pixel + self.per_pixel_per_distance * distance.max(0.0))
    }
}

/// Ray distance to the candidate, if it is hit.
pub fn intersect(ray: &PickRay, candidate: &PickCandidate, tolerance: &LineTolerance) -> Option<f32> {
    let affine = candidate.world_from_local;
    match candidate.shape {
        PickShape::Segments(segments) => segments
            .iter()
            .filter_map(|[a, b]| {
                let (distance, t) =
                    ray_segment_distance(ray, affine.transform_point3(*a), affine.transform_point3(*b));
                (distance <= tolerance.at(t)).then_some(t)
            })
            .min_by(f32::total_cmp),
        PickShape::Sphere { center, radius } => {
            let scale = affine.matrix3.x_axis.length()
                .max(affine.matrix3.y_axis.length())
                .max(affine.matrix3.z_axis.length());
            ray_sphere_hit(ray, affine.transform_point3(*center), radius * scale)
        }
        PickShape::Mesh => candidate.mesh.and_then(|mesh| mesh_hit(ray, mesh, affine)),
    }
}

/// Triangle test in mesh-local space. The ray parameter is preserved by the
/// affine map, so local distances are world distances.
fn mesh_hit(ray: &PickRay, mesh: &Mesh, world_from_local: Affine3A) -> Option<f32> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let local_from_world = world_from_local.inverse();
    let local = PickRay {
        origin: local_from_world.transform_point3(ray.origin),
        direction: local_from_world.transform_vector3(ray.direction),
    };

    let aabb = mesh.compute_aabb()?;
    let min = Vec3::from(aabb.center - aabb.half_extents);
    let max = Vec3::from(aabb.center + aabb.half_extents);
    ray_aabb_hit_t(local.origin, local.direction, min, max)?;

    let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION)?.as_float3()?;
    let vertex = |i: usize| positions.get(i).map(|p| Vec3::from(*p));
    let triangle = |a: usize, b: usize, c: usize| -> Option<f32> {
        ray_triangle_hit(&local, vertex(a)?, vertex(b)?, vertex(c)?)
    };

    match mesh.indices() {
        Some(indices) => {
            let indices: Vec<usize> = match indices {
                Indices::U16(values) => values.iter().map(|&i| i as usize).collect(),
                Indices::U32(values) => values.iter().map(|&i| i as usize).collect(),
            };
            indices
                .chunks_exact(3)
                .filter_map(|tri| triangle(tri[0], tri[1], tri[2]))
                .min_by(f32::total_cmp)
        }
        None => (0..positions.len() / 3)
            .filter_map(|i| triangle(i * 3, i * 3 + 1, i * 3 + 2))
            .min_by(f32::total_cmp),
    }
}

/// Nearest candidate along the ray.
pub fn nearest_hit<'a>(
    ray: &PickRay,
    candidates: impl IntoIterator<Item = PickCandidate<'a>>,
    tolerance: &LineTolerance,
) -> Option<PickHit> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            intersect(ray, &candidate, tolerance).map(|distance| PickHit {
                entity: candidate.entity,
                distance,
            })
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Label of the hit entity, its parent or its grandparent, in that order.
pub fn resolve_label(
    entity: Entity,
    labels: &Query<&SemanticLabel>,
    parents: &Query<&ChildOf>,
) -> Option<String> {
    let mut current = entity;
    for level in 0..3 {
        if let Ok(label) = labels.get(current) {
            return Some(label.0.clone());
        }
        if level == 2 {
            break;
        }
        current = parents.get(current).ok()?.parent();
    }
    None
}

/// World ray under a pointer position for the given camera.
pub fn pointer_ray(
    pointer: Vec2,
    camera: &Camera,
    camera_transform: &GlobalTransform,
) -> Option<PickRay> {
    let viewport = camera.logical_viewport_rect()?;
    if !viewport.contains(pointer) {
        return None;
    }
    let ndc = pointer_to_ndc(pointer, viewport)?;
    let world_from_clip = camera_transform.compute_matrix() * camera.clip_from_view().inverse();
    ndc_to_ray(ndc, world_from_clip)
}

fn tolerance_for(projection: &Projection, pixels: f32, viewport_height: f32) -> LineTolerance {
    match projection {
        Projection::Orthographic(ortho) => {
            LineTolerance::orthographic(pixels, ortho.area.height(), viewport_height)
        }
        Projection::Perspective(perspective) => {
            LineTolerance::perspective(pixels, perspective.fov, viewport_height)
        }
        _ => LineTolerance::perspective(pixels, std::f32::consts::FRAC_PI_4, viewport_height),
    }
}

/// Recompute the hovered label on every pointer move.
#[allow(clippy::too_many_arguments)]
pub fn update_hover(
    mut cursor_moved: EventReader<CursorMoved>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform, &Projection), With<Camera3d>>,
    candidates: Query<
        (Entity, &PickShape, &GlobalTransform, &InheritedVisibility, Option<&Mesh3d>),
        With<ComposedContent>,
    >,
    meshes: Res<Assets<Mesh>>,
    labels: Query<&SemanticLabel>,
    parents: Query<&ChildOf>,
    config: Res<ViewerConfig>,
    mut hover: ResMut<HoverState>,
) {
    if cursor_moved.is_empty() {
        return;
    }
    cursor_moved.clear();

    let pointer = windows.single().ok().and_then(Window::cursor_position);
    let Some(pointer) = pointer else {
        hover.set_if_neq(HoverState::default());
        return;
    };
    let Ok((camera, camera_transform, projection)) = cameras.single() else {
        return;
    };
    let Some(ray) = pointer_ray(pointer, camera, camera_transform) else {
        hover.set_if_neq(HoverState {
            label: None,
            pointer: Some(pointer),
        });
        return;
    };
    let viewport_height = camera
        .logical_viewport_size()
        .map(|size| size.y)
        .unwrap_or(1.0);
    let tolerance = tolerance_for(projection, config.pick_tolerance_px, viewport_height);

    let visible = candidates
        .iter()
        .filter(|(_, _, _, visibility, _)| visibility.get())
        .map(|(entity, shape, transform, _, mesh)| PickCandidate {
            entity,
            shape,
            world_from_local: transform.affine(),
            mesh: mesh.and_then(|m| meshes.get(&m.0)),
        });

    let label = nearest_hit(&ray, visible, &tolerance)
        .and_then(|hit| resolve_label(hit.entity, &labels, &parents));

    hover.set_if_neq(HoverState {
        label,
        pointer: Some(pointer),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::SystemState;

    fn ray() -> PickRay {
        PickRay {
            origin: Vec3::new(0.0, 0.0, 10.0),
            direction: Vec3::NEG_Z,
        }
    }

    fn tolerance() -> LineTolerance {
        LineTolerance::orthographic(6.0, 6.0, 600.0)
    }

    #[test]
    fn perspective_tolerance_grows_with_distance() {
        let tol = LineTolerance::perspective(6.0, std::f32::consts::FRAC_PI_2, 600.0);
        assert!((tol.at(300.0) - 6.0).abs() < 1e-3);
        assert!(tol.at(600.0) > tol.at(300.0));
    }

    #[test]
    fn nearest_of_overlapping_candidates_wins() {
        let far = PickShape::Sphere { center: Vec3::ZERO, radius: 1.0 };
        let near = PickShape::Sphere { center: Vec3::new(0.0, 0.0, 5.0), radius: 1.0 };
        let candidates = [
            PickCandidate {
                entity: Entity::from_raw(1),
                shape: &far,
                world_from_local: Affine3A::IDENTITY,
                mesh: None,
            },
            PickCandidate {
                entity: Entity::from_raw(2),
                shape: &near,
                world_from_local: Affine3A::IDENTITY,
                mesh: None,
            },
        ];
        let hit = nearest_hit(&ray(), candidates, &tolerance()).unwrap();
        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn line_within_pixel_tolerance_is_hit() {
        // One pixel is 0.01 world units, so 6 px is 0.06.
        let near_miss = PickShape::Segments(vec![[Vec3::new(-1.0, 0.05, 0.0), Vec3::new(1.0, 0.05, 0.0)]]);
        let far_miss = PickShape::Segments(vec![[Vec3::new(-1.0, 0.2, 0.0), Vec3::new(1.0, 0.2, 0.0)]]);
        let candidate = |shape| PickCandidate {
            entity: Entity::from_raw(1),
            shape,
            world_from_local: Affine3A::IDENTITY,
            mesh: None,
        };
        assert!(intersect(&ray(), &candidate(&near_miss), &tolerance()).is_some());
        assert!(intersect(&ray(), &candidate(&far_miss), &tolerance()).is_none());
    }

    #[test]
    fn shapes_are_tested_in_world_space() {
        let shape = PickShape::Sphere { center: Vec3::ZERO, radius: 1.0 };
        let candidate = PickCandidate {
            entity: Entity::from_raw(1),
            shape: &shape,
            world_from_local: Affine3A::from_scale_rotation_translation(
                Vec3::splat(0.5),
                Quat::IDENTITY,
                Vec3::new(3.0, 0.0, 0.0),
            ),
            mesh: None,
        };
        assert!(intersect(&ray(), &candidate, &tolerance()).is_none());
    }

    #[test]
    fn mesh_triangles_are_hit_through_scaled_transform() {
        let mesh = Mesh::new(PrimitiveTopology::TriangleList, default())
            .with_inserted_attribute(
                Mesh::ATTRIBUTE_POSITION,
                vec![[-10.0, -10.0, 0.0], [10.0, -10.0, 0.0], [0.0, 10.0, 0.0]],
            )
            .with_inserted_indices(Indices::U32(vec![0, 1, 2]));
        let shape = PickShape::Mesh;
        let candidate = PickCandidate {
            entity: Entity::from_raw(1),
            shape: &shape,
            world_from_local: Affine3A::from_scale(Vec3::splat(0.025)),
            mesh: Some(&mesh),
        };
        let distance = intersect(&ray(), &candidate, &tolerance()).unwrap();
        assert!((distance - 10.0).abs() < 1e-4);
    }

    #[test]
    fn empty_scene_has_no_hit() {
        assert!(nearest_hit(&ray(), Vec::new(), &tolerance()).is_none());
    }

    #[test]
    fn child_line_resolves_to_bundle_group_label() {
        let mut world = World::new();
        let group = world
            .spawn((Name::new("bundle:AF"), SemanticLabel("Arcuate fasciculus".into())))
            .id();
        let wiring = world.spawn(ChildOf(group)).id();
        let line = world.spawn(ChildOf(wiring)).id();

        let mut state: SystemState<(Query<&SemanticLabel>, Query<&ChildOf>)> =
            SystemState::new(&mut world);
        let (labels, parents) = state.get(&world);
        assert_eq!(
            resolve_label(line, &labels, &parents).as_deref(),
            Some("Arcuate fasciculus")
        );
    }

    #[test]
    fn label_search_stops_at_grandparent() {
        let mut world = World::new();
        let labelled = world.spawn(SemanticLabel("Too far".into())).id();
        let a = world.spawn(ChildOf(labelled)).id();
        let b = world.spawn(ChildOf(a)).id();
        let c = world.spawn(ChildOf(b)).id();
        let unparented = world.spawn_empty().id();

        let mut state: SystemState<(Query<&SemanticLabel>, Query<&ChildOf>)> =
            SystemState::new(&mut world);
        let (labels, parents) = state.get(&world);
        assert_eq!(resolve_label(c, &labels, &parents), None);
        assert_eq!(resolve_label(b, &labels, &parents).as_deref(), Some("Too far"));
        assert_eq!(resolve_label(unparented, &labels, &parents), None);
    }
}
