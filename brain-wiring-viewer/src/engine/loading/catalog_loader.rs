use crate::engine::assets::networks::NetworkCatalog;
use crate::engine::scene::composer::CompositionDirty;
use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::path::NETWORK_CATALOG_PATH;

#[derive(Resource, Default)]
pub struct NetworkCatalogLoader {
    handle: Option<Handle<NetworkCatalog>>,
    loaded: bool,
}

pub fn start_catalog_loading(
    mut loader: ResMut<NetworkCatalogLoader>,
    asset_server: Res<AssetServer>,
) {
    loader.handle = Some(asset_server.load(NETWORK_CATALOG_PATH));
}

/// Publish the built-in network catalogue once the asset server has it.
pub fn load_catalog_system(
    mut loader: ResMut<NetworkCatalogLoader>,
    catalogs: Res<Assets<NetworkCatalog>>,
    asset_server: Res<AssetServer>,
    mut dirty: ResMut<CompositionDirty>,
    mut commands: Commands,
) {
    if loader.loaded {
        return;
    }
    let Some(handle) = loader.handle.clone() else {
        return;
    };

    if let Some(catalog) = catalogs.get(&handle) {
        info!("Network catalogue loaded: {} networks", catalog.networks.len());
        commands.insert_resource(catalog.clone());
        dirty.networks = true;
        loader.loaded = true;
    } else if let LoadState::Failed(err) = asset_server.load_state(&handle) {
        error!("Network catalogue {} failed to load: {}", NETWORK_CATALOG_PATH, err);
        commands.insert_resource(NetworkCatalog::default());
        loader.loaded = true;
    }
}
