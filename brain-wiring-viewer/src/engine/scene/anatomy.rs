//! Anatomy shell entities, bounds measurement and shell styling.

use crate::engine::assets::bounds::BoundsData;
use crate::engine::core::params::ViewerParams;
use bevy::gltf::Gltf;
use bevy::math::Affine3A;
use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;

/// Root of the anatomy for one pack load, real or placeholder.
#[derive(Component, Debug, Clone)]
pub struct AnatomyModel {
    pub generation: u64,
    /// Resolved asset path; `None` for the placeholder shell
    pub url: Option<String>,
    /// Root glTF handle, watched for load failure
    pub source: Option<Handle<Gltf>>,
    /// Scene 0 of the glTF, also watched: a missing label fails only this one
    pub scene: Option<Handle<Scene>>,
}

/// A renderable anatomy mesh with the untouched original kept for cutaway.
#[derive(Component, Debug, Clone)]
pub struct AnatomyMesh {
    pub original: Handle<Mesh>,
    /// Cutaway ratio the current `Mesh3d` was built with
    pub applied_cutaway: f32,
}

impl AnatomyMesh {
    pub fn new(original: Handle<Mesh>) -> Self {
        Self {
            original,
            applied_cutaway: 0.0,
        }
    }
}

/// Shell material colour used for the placeholder and untextured anatomy.
pub const SHELL_COLOR: Color = Color::srgb(0.82, 0.78, 0.76);

/// Axis-aligned bounds of a mesh's positions in its own space.
pub fn mesh_bounds(mesh: &Mesh) -> Option<BoundsData> {
    match mesh.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(positions) => {
            BoundsData::from_points(positions.iter().map(|p| Vec3::from_array(*p)))
        }
        _ => None,
    }
}

/// Union of mesh bounds, each placed by its transform relative to the anatomy root.
pub fn anatomy_bounds<'a>(meshes: impl IntoIterator<Item = (Affine3A, &'a Mesh)>) -> Option<BoundsData> {
    meshes
        .into_iter()
        .filter_map(|(affine, mesh)| mesh_bounds(mesh).map(|b| b.transformed(&affine)))
        .reduce(|acc, b| acc.union(&b))
}

/// Transform of `entity` relative to `ancestor`, composed from local transforms.
///
/// Global transforms are not propagated yet when a scene instance becomes
/// ready, so the chain is walked by hand.
pub fn relative_affine(
    entity: Entity,
    ancestor: Entity,
    parents: &Query<&ChildOf>,
    transforms: &Query<&Transform>,
) -> Affine3A {
    let mut affine = Affine3A::IDENTITY;
    let mut current = entity;
    while current != ancestor {
        if let Ok(transform) = transforms.get(current) {
            affine = transform.compute_affine() * affine;
        }
        match parents.get(current) {
            Ok(child_of) => current = child_of.parent(),
            Err(_) => break,
        }
    }
    affine
}

pub fn shell_material(opacity: f32) -> StandardMaterial {
    let mut material = StandardMaterial {
        base_color: SHELL_COLOR,
        perceptual_roughness: 0.8,
        double_sided: true,
        cull_mode: None,
        ..default()
    };
    set_material_opacity(&mut material, opacity);
    material
}

pub fn set_material_opacity(material: &mut StandardMaterial, opacity: f32) {
    material.base_color.set_alpha(opacity);
    material.alpha_mode = if opacity < 1.0 {
        AlphaMode::Blend
    } else {
        AlphaMode::Opaque
    };
}

/// Keep every anatomy material at the current shell opacity.
pub fn apply_shell_opacity(
    params: Res<ViewerParams>,
    shells: Query<&MeshMaterial3d<StandardMaterial>, With<AnatomyMesh>>,
    added: Query<(), Added<AnatomyMesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !params.is_changed() && added.is_empty() {
        return;
    }
    for handle in &shells {
        if let Some(material) = materials.get_mut(&handle.0) {
            if material.base_color.alpha() != params.shell_opacity {
                set_material_opacity(material, params.shell_opacity);
            }
        }
    }
}
