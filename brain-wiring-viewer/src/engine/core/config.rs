use bevy::prelude::*;
use constants::path::{DEFAULT_PACK_TAG, PACK_ROOT_TEMPLATE};
use constants::render_settings::{PICK_TOLERANCE_PX, THIN_LINE_THRESHOLD_PX};

/// Start-up configuration, fixed for the lifetime of the app.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Pack root relative to the asset root, `{tag}` substituted per load
    pub pack_root_template: String,
    pub initial_pack: String,
    /// Append a varying query parameter to manifest and payload requests
    pub cache_bust: bool,
    pub thin_line_threshold_px: f32,
    pub pick_tolerance_px: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            pack_root_template: PACK_ROOT_TEMPLATE.to_string(),
            initial_pack: DEFAULT_PACK_TAG.to_string(),
            cache_bust: true,
            thin_line_threshold_px: THIN_LINE_THRESHOLD_PX,
            pick_tolerance_px: PICK_TOLERANCE_PX,
        }
    }
}

impl ViewerConfig {
    pub fn with_overrides(
        mut self,
        pack: Option<String>,
        pack_root: Option<String>,
        cache_bust: Option<bool>,
    ) -> Self {
        if let Some(pack) = pack.filter(|p| !p.trim().is_empty()) {
            self.initial_pack = pack.trim().to_string();
        }
        if let Some(root) = pack_root.filter(|r| !r.trim().is_empty()) {
            self.pack_root_template = root.trim().trim_end_matches('/').to_string();
        }
        if let Some(cache_bust) = cache_bust {
            self.cache_bust = cache_bust;
        }
        self
    }

    /// Configuration from command-line arguments.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_environment() -> Self {
        use clap::Parser;

        let cli = Cli::parse();
        Self::default().with_overrides(cli.pack, cli.pack_root, cli.no_cache_bust.then_some(false))
    }

    /// Configuration from the page URL, e.g. `?pack=v0.2&packRoot=packs/{tag}`.
    #[cfg(target_arch = "wasm32")]
    pub fn from_environment() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::default();
        };
        let Ok(href) = window.location().href() else {
            return Self::default();
        };
        let Ok(url) = web_sys::Url::new(&href) else {
            return Self::default();
        };
        let params = url.search_params();
        let cache_bust = params.get("cacheBust").map(|v| v != "0" && v != "false");
        Self::default().with_overrides(params.get("pack"), params.get("packRoot"), cache_bust)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser, Debug)]
#[command(name = "brain-wiring-viewer", about = "Interactive 3D brain wiring diagram")]
struct Cli {
    /// Pack tag to load at start-up
    #[arg(long)]
    pack: Option<String>,

    /// Pack root under the asset directory; `{tag}` is replaced by the pack tag
    #[arg(long)]
    pack_root: Option<String>,

    /// Do not append cache-defeating query parameters to JSON requests
    #[arg(long)]
    no_cache_bust: bool,
}
