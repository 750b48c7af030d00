/// Pack tag loaded when nothing else is requested.
pub const DEFAULT_PACK_TAG: &str = "v0.1";

/// Pack root relative to the asset root. `{tag}` is replaced by the pack tag.
pub const PACK_ROOT_TEMPLATE: &str = "packs/{tag}";

/// Manifest file name inside every pack root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Prefix the browser build uses to reach the Bevy asset root over HTTP.
pub const WEB_ASSET_ROOT: &str = "assets";

/// Built-in functional network catalogue, loaded through the asset server.
pub const NETWORK_CATALOG_PATH: &str = "networks/functional.networks.json";

/// Query parameter appended to JSON requests to defeat stale caches.
pub const CACHE_BUST_PARAM: &str = "v";

/// Screen-space wide line shader.
pub const WIDE_LINE_SHADER_PATH: &str = "shaders/wide_line.wgsl";

/// File name prefix for exported still images.
pub const SNAPSHOT_FILE_PREFIX: &str = "wiring";
