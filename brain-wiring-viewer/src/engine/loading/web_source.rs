//! `http` and `https` asset sources for absolute mesh URLs.
//!
//! A manifest may point its anatomy or bundle meshes at another host. The
//! asset server sees `https://host/dir/brain.glb` as source `https` with path
//! `host/dir/brain.glb`, so buffers and textures the glTF references by
//! relative URI are requested from the same base.

use super::fetcher::fetch_bytes;
use crate::engine::error::FetchError;
use bevy::asset::AssetApp;
use bevy::asset::io::{
    AssetReader, AssetReaderError, AssetSource, PathStream, Reader, VecReader,
};
use bevy::prelude::*;
use std::path::Path;
use std::sync::Arc;

pub const WEB_SCHEMES: [&str; 2] = ["http", "https"];

/// Reads asset bytes over HTTP for one scheme.
#[derive(Debug, Clone, Copy)]
pub struct WebAssetReader {
    scheme: &'static str,
}

impl WebAssetReader {
    pub fn new(scheme: &'static str) -> Self {
        Self { scheme }
    }

    /// Rebuild the full URL from the source-relative path.
    pub fn url_for(&self, path: &Path) -> String {
        let path = path.to_string_lossy().replace('\\', "/");
        format!("{}://{}", self.scheme, path)
    }
}

fn reader_error(path: &Path, err: FetchError) -> AssetReaderError {
    match err {
        FetchError::Status { status: 404, .. } => AssetReaderError::NotFound(path.to_path_buf()),
        FetchError::Status { status, .. } => AssetReaderError::HttpError(status),
        FetchError::Transport { .. } => {
            AssetReaderError::Io(Arc::new(std::io::Error::other(err.to_string())))
        }
    }
}

impl AssetReader for WebAssetReader {
    async fn read<'a>(&'a self, path: &'a Path) -> Result<impl Reader + 'a, AssetReaderError> {
        let url = self.url_for(path);
        debug!("Fetching mesh asset {}", url);
        let bytes = fetch_bytes(&url)
            .await
            .map_err(|err| reader_error(path, err))?;
        Ok(VecReader::new(bytes))
    }

    async fn read_meta<'a>(&'a self, path: &'a Path) -> Result<impl Reader + 'a, AssetReaderError> {
        // Meta files are never served next to remote meshes.
        Err::<VecReader, _>(AssetReaderError::NotFound(path.to_path_buf()))
    }

    async fn read_directory<'a>(
        &'a self,
        path: &'a Path,
    ) -> Result<Box<PathStream>, AssetReaderError> {
        Err(AssetReaderError::NotFound(path.to_path_buf()))
    }

    async fn is_directory<'a>(&'a self, _path: &'a Path) -> Result<bool, AssetReaderError> {
        Ok(false)
    }
}

/// Registers the web sources. Must be added before `AssetPlugin`.
pub struct WebAssetSourcePlugin;

impl Plugin for WebAssetSourcePlugin {
    fn build(&self, app: &mut App) {
        for scheme in WEB_SCHEMES {
            app.register_asset_source(
                scheme,
                AssetSource::build().with_reader(move || Box::new(WebAssetReader::new(scheme))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::location::mesh_asset_path;
    use bevy::asset::AssetPath;
    use bevy::asset::io::AssetSourceId;

    #[test]
    fn absolute_mesh_url_maps_onto_https_source() {
        let path = mesh_asset_path("packs/v0.1", "https://cdn.example.org/meshes/af.glb");
        let asset_path = AssetPath::parse(&path);
        assert_eq!(asset_path.source(), &AssetSourceId::from("https"));
        assert_eq!(asset_path.path(), Path::new("cdn.example.org/meshes/af.glb"));

        let reader = WebAssetReader::new("https");
        assert_eq!(reader.url_for(asset_path.path()), path);
    }

    #[test]
    fn relative_buffers_stay_on_the_same_host() {
        let reader = WebAssetReader::new("https");
        let gltf = Path::new("cdn.example.org/meshes/af.gltf");
        let buffer = gltf.parent().unwrap().join("af.bin");
        assert_eq!(reader.url_for(&buffer), "https://cdn.example.org/meshes/af.bin");
    }

    #[test]
    fn http_failures_map_onto_reader_errors() {
        let path = Path::new("cdn.example.org/a.glb");
        let missing = FetchError::Status {
            url: "https://cdn.example.org/a.glb".to_string(),
            status: 404,
        };
        assert!(matches!(reader_error(path, missing), AssetReaderError::NotFound(_)));

        let forbidden = FetchError::Status {
            url: "https://cdn.example.org/a.glb".to_string(),
            status: 403,
        };
        assert!(matches!(reader_error(path, forbidden), AssetReaderError::HttpError(403)));
    }

    #[test]
    fn plugin_registers_both_schemes() {
        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            WebAssetSourcePlugin,
            AssetPlugin::default(),
        ));
        let server = app.world().resource::<AssetServer>();
        for scheme in WEB_SCHEMES {
            assert!(server.get_source(scheme).is_ok(), "{scheme}");
        }
    }
}
