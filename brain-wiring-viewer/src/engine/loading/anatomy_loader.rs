//! Anatomy loading, placeholder substitution and normalization hand-off.
//!
//! A manifest with an anatomy entry spawns the glTF scene under the
//! normalized root; its bounds are measured once the scene instance is
//! ready. Missing or failed anatomy is replaced by the placeholder shell,
//! whose bounds drive normalization the same way.

use super::pack_loader::PackEvent;
use super::pack_session::{AnatomyStatus, PackSession};
use crate::engine::assets::location::mesh_asset_path;
use crate::engine::core::params::ViewerParams;
use crate::engine::error::LoadError;
use crate::engine::scene::anatomy::{
    AnatomyMesh, AnatomyModel, anatomy_bounds, mesh_bounds, relative_affine, shell_material,
};
use crate::engine::scene::composer::CompositionDirty;
use crate::engine::scene::normalization::{NormalizedRoot, SceneNormalization};
use crate::engine::scene::placeholder::{PlaceholderShell, brain_shell_mesh};
use bevy::asset::{LoadState, UntypedAssetId};
use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

/// React to manifest outcomes by replacing the anatomy.
pub fn handle_pack_events(
    mut events: EventReader<PackEvent>,
    mut session: ResMut<PackSession>,
    mut normalization: ResMut<SceneNormalization>,
    mut dirty: ResMut<CompositionDirty>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    params: Res<ViewerParams>,
    asset_server: Res<AssetServer>,
    existing: Query<Entity, With<AnatomyModel>>,
    roots: Query<Entity, With<NormalizedRoot>>,
    mut commands: Commands,
) {
    let Ok(root) = roots.single() else {
        return;
    };

    for event in events.read() {
        match event {
            PackEvent::ManifestAccepted { generation, .. } => {
                for entity in &existing {
                    commands.entity(entity).despawn();
                }
                normalization.reset(*generation);

                let anatomy = session.manifest().and_then(|m| m.anatomy.clone());
                let Some(anatomy) = anatomy else {
                    info!("Pack has no anatomy; showing placeholder shell");
                    spawn_placeholder(
                        &mut commands,
                        root,
                        *generation,
                        &mut meshes,
                        &mut materials,
                        &params,
                        &mut normalization,
                        &mut dirty,
                    );
                    session.on_anatomy(*generation, AnatomyStatus::Absent);
                    continue;
                };

                let path = mesh_asset_path(session.loaded_root(), &anatomy.url);
                let source = asset_server.load::<bevy::gltf::Gltf>(path.clone());
                let scene = asset_server.load(GltfAssetLabel::Scene(0).from_asset(path.clone()));
                info!("Loading anatomy {}", path);

                commands
                    .spawn((
                        Name::new(anatomy.name.clone().unwrap_or_else(|| "Anatomy".to_string())),
                        AnatomyModel {
                            generation: *generation,
                            url: Some(path),
                            source: Some(source),
                            scene: Some(scene.clone()),
                        },
                        SceneRoot(scene),
                        ChildOf(root),
                    ))
                    .observe(measure_anatomy_scene);
            }
            PackEvent::ManifestFailed { generation, .. } => {
                if existing.is_empty() {
                    info!("No content to keep after failed load; showing placeholder shell");
                    normalization.reset(*generation);
                    spawn_placeholder(
                        &mut commands,
                        root,
                        *generation,
                        &mut meshes,
                        &mut materials,
                        &params,
                        &mut normalization,
                        &mut dirty,
                    );
                    session.on_placeholder_only();
                }
            }
        }
    }
}

/// Spawn the placeholder shell and normalize to its bounds.
#[allow(clippy::too_many_arguments)]
pub fn spawn_placeholder(
    commands: &mut Commands,
    root: Entity,
    generation: u64,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    params: &ViewerParams,
    normalization: &mut SceneNormalization,
    dirty: &mut CompositionDirty,
) {
    let mesh = brain_shell_mesh();
    let bounds = mesh_bounds(&mesh);
    let mesh = meshes.add(mesh);
    let material = materials.add(shell_material(params.shell_opacity));

    commands.spawn((
        Name::new("Placeholder shell"),
        AnatomyModel {
            generation,
            url: None,
            source: None,
            scene: None,
        },
        PlaceholderShell,
        AnatomyMesh::new(mesh.clone()),
        Mesh3d(mesh),
        MeshMaterial3d(material),
        NotShadowCaster,
        Transform::IDENTITY,
        ChildOf(root),
    ));

    if let Some(bounds) = bounds {
        let transform = normalization.set_from_bounds(generation, bounds);
        info!(
            "Normalization from placeholder: center {:?}, scale {}",
            transform.center, transform.scale
        );
        dirty.bundles = true;
        dirty.networks = true;
    }
}

/// Measure a freshly instanced anatomy scene and normalize to it.
#[allow(clippy::too_many_arguments)]
pub fn measure_anatomy_scene(
    trigger: Trigger<SceneInstanceReady>,
    models: Query<&AnatomyModel>,
    children: Query<&Children>,
    mesh_entities: Query<&Mesh3d>,
    parents: Query<&ChildOf>,
    transforms: Query<&Transform>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    roots: Query<Entity, With<NormalizedRoot>>,
    mut session: ResMut<PackSession>,
    mut normalization: ResMut<SceneNormalization>,
    mut dirty: ResMut<CompositionDirty>,
    params: Res<ViewerParams>,
    mut commands: Commands,
) {
    let anatomy = trigger.target();
    let Ok(model) = models.get(anatomy) else {
        return;
    };
    if model.generation != session.manifest_generation() {
        debug!("Ignoring anatomy from generation {}", model.generation);
        return;
    }

    let mesh_nodes: Vec<(Entity, Handle<Mesh>)> = children
        .iter_descendants(anatomy)
        .filter_map(|e| mesh_entities.get(e).ok().map(|m| (e, m.0.clone())))
        .collect();

    let bounds = anatomy_bounds(mesh_nodes.iter().filter_map(|(entity, handle)| {
        meshes
            .get(handle)
            .map(|mesh| (relative_affine(*entity, anatomy, &parents, &transforms), mesh))
    }));

    let url = model.url.clone().unwrap_or_default();
    let Some(bounds) = bounds else {
        let err = LoadError::EmptyScene { url };
        warn!("{}; showing placeholder shell", err);
        commands.entity(anatomy).despawn();
        if let Ok(root) = roots.single() {
            spawn_placeholder(
                &mut commands,
                root,
                model.generation,
                &mut meshes,
                &mut materials,
                &params,
                &mut normalization,
                &mut dirty,
            );
        }
        session.on_anatomy(model.generation, AnatomyStatus::Failed(err.to_string()));
        return;
    };

    for (entity, handle) in mesh_nodes {
        commands
            .entity(entity)
            .insert((AnatomyMesh::new(handle), NotShadowCaster));
    }

    let transform = normalization.set_from_bounds(model.generation, bounds);
    info!(
        "Anatomy {} ready: center {:?}, scale {}",
        url, transform.center, transform.scale
    );
    session.on_anatomy(model.generation, AnatomyStatus::Loaded);
    dirty.bundles = true;
    dirty.networks = true;
}

/// First failure among the glTF and its default scene, if any.
///
/// A glTF that decodes but has no scene 0 only fails the labeled scene
/// handle, so both are checked.
pub fn anatomy_failure(
    model: &AnatomyModel,
    failure: impl Fn(UntypedAssetId) -> Option<String>,
) -> Option<LoadError> {
    let ids = [
        model.source.as_ref().map(|h| h.id().untyped()),
        model.scene.as_ref().map(|h| h.id().untyped()),
    ];
    ids.into_iter()
        .flatten()
        .find_map(&failure)
        .map(|reason| LoadError::Asset {
            url: model.url.clone().unwrap_or_default(),
            reason,
        })
}

/// Swap failed anatomy loads for the placeholder shell.
#[allow(clippy::too_many_arguments)]
pub fn watch_anatomy_failures(
    models: Query<(Entity, &AnatomyModel)>,
    asset_server: Res<AssetServer>,
    roots: Query<Entity, With<NormalizedRoot>>,
    mut session: ResMut<PackSession>,
    mut normalization: ResMut<SceneNormalization>,
    mut dirty: ResMut<CompositionDirty>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    params: Res<ViewerParams>,
    mut commands: Commands,
) {
    for (entity, model) in &models {
        let failed = |id: UntypedAssetId| match asset_server.get_load_state(id) {
            Some(LoadState::Failed(reason)) => Some(reason.to_string()),
            _ => None,
        };
        let Some(err) = anatomy_failure(model, failed) else {
            continue;
        };
        error!("{}; showing placeholder shell", err);
        commands.entity(entity).despawn();

        if model.generation == session.manifest_generation() {
            if let Ok(root) = roots.single() {
                spawn_placeholder(
                    &mut commands,
                    root,
                    model.generation,
                    &mut meshes,
                    &mut materials,
                    &params,
                    &mut normalization,
                    &mut dirty,
                );
            }
            session.on_anatomy(model.generation, AnatomyStatus::Failed(err.to_string()));
        }
    }
}
