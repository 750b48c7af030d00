/// Procedural two-hemisphere shell shown when a pack has no usable anatomy.
use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use std::f32::consts::{PI, TAU};

/// Hemisphere half-extents in millimetres (lateral, vertical, anterior-posterior).
const HEMISPHERE_RADII: Vec3 = Vec3::new(34.0, 55.0, 82.0);
/// Lateral offset of each hemisphere centre from the midline.
const HEMISPHERE_OFFSET_MM: f32 = 36.0;
const SEGMENTS: u32 = 48;
const RINGS: u32 = 32;

#[derive(Component, Debug, Default)]
pub struct PlaceholderShell;

/// Mesh of two ellipsoids either side of the midline, in the display frame.
pub fn brain_shell_mesh() -> Mesh {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for side in [-1.0, 1.0] {
        let center = Vec3::new(side * HEMISPHERE_OFFSET_MM, 0.0, 0.0);
        push_ellipsoid(center, HEMISPHERE_RADII, &mut positions, &mut normals, &mut indices);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

fn push_ellipsoid(
    center: Vec3,
    radii: Vec3,
    positions: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    indices: &mut Vec<u32>,
) {
    let base = positions.len() as u32;

    for ring in 0..=RINGS {
        let theta = PI * ring as f32 / RINGS as f32;
        for segment in 0..=SEGMENTS {
            let phi = TAU * segment as f32 / SEGMENTS as f32;
            let unit = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            positions.push((center + unit * radii).to_array());
            // Gradient of the implicit surface.
            normals.push((unit / radii).normalize_or_zero().to_array());
        }
    }

    let stride = SEGMENTS + 1;
    for ring in 0..RINGS {
        for segment in 0..SEGMENTS {
            let a = base + ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }
}
