/// Sagittal cutaway of the anatomy shell.
use super::anatomy::AnatomyMesh;
use crate::engine::core::params::ViewerParams;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, VertexAttributeValues};
use constants::render_settings::MAX_CUTAWAY;

/// Keep the triangles whose centroid lies on or left of `plane_x`.
pub fn cut_triangles(positions: &[[f32; 3]], indices: &[u32], plane_x: f32) -> Vec<u32> {
    indices
        .chunks_exact(3)
        .filter(|tri| {
            let centroid_x: f32 = tri
                .iter()
                .filter_map(|&i| positions.get(i as usize))
                .map(|p| p[0])
                .sum::<f32>()
                / 3.0;
            centroid_x <= plane_x
        })
        .flatten()
        .copied()
        .collect()
}

/// Plane position for a cutaway ratio over an x range.
pub fn cut_plane_x(min_x: f32, max_x: f32, cutaway: f32) -> f32 {
    max_x - cutaway.clamp(0.0, MAX_CUTAWAY) * (max_x - min_x)
}

/// Copy of `original` with the cut triangles removed. `None` if the mesh has
/// no readable positions.
pub fn cut_mesh(original: &Mesh, cutaway: f32) -> Option<Mesh> {
    let VertexAttributeValues::Float32x3(positions) = original.attribute(Mesh::ATTRIBUTE_POSITION)?
    else {
        return None;
    };

    let indices: Vec<u32> = match original.indices() {
        Some(Indices::U32(indices)) => indices.clone(),
        Some(Indices::U16(indices)) => indices.iter().map(|&i| i as u32).collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let (min_x, max_x) = positions
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p[0]), hi.max(p[0]))
        });
    if !min_x.is_finite() {
        return None;
    }

    let kept = cut_triangles(positions, &indices, cut_plane_x(min_x, max_x, cutaway));
    let mut mesh = original.clone();
    mesh.insert_indices(Indices::U32(kept));
    Some(mesh)
}

/// Rebuild anatomy meshes whose applied cutaway differs from the parameter.
pub fn apply_cutaway(
    params: Res<ViewerParams>,
    mut anatomy: Query<(&mut AnatomyMesh, &mut Mesh3d)>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let cutaway = params.cutaway;
    for (mut anatomy_mesh, mut mesh3d) in &mut anatomy {
        if anatomy_mesh.applied_cutaway == cutaway {
            continue;
        }

        if cutaway <= 0.0 {
            mesh3d.0 = anatomy_mesh.original.clone();
        } else {
            let Some(original) = meshes.get(&anatomy_mesh.original) else {
                continue;
            };
            let Some(cut) = cut_mesh(original, cutaway) else {
                warn!("Anatomy mesh has no readable positions; cutaway skipped");
                anatomy_mesh.applied_cutaway = cutaway;
                continue;
            };
            mesh3d.0 = meshes.add(cut);
        }
        anatomy_mesh.applied_cutaway = cutaway;
    }
}
