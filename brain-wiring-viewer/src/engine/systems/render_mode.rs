use crate::engine::core::params::ViewerParams;
use crate::engine::scene::composer::{BundleSurface, BundleWiring};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Which structural representation of each bundle is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Surface,
    Wiring,
    #[default]
    Both,
}

impl RenderMode {
    pub const ALL: [RenderMode; 3] = [RenderMode::Surface, RenderMode::Wiring, RenderMode::Both];

    pub fn shows_surface(&self) -> bool {
        matches!(self, Self::Surface | Self::Both)
    }

    pub fn shows_wiring(&self) -> bool {
        matches!(self, Self::Wiring | Self::Both)
    }

    /// Convert string identifier to render mode for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "surface" => Some(Self::Surface),
            "wiring" => Some(Self::Wiring),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Wiring => "wiring",
            Self::Both => "both",
        }
    }
}

fn visibility_for(shown: bool) -> Visibility {
    if shown {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Handle render mode switching via keyboard input.
/// Both representations stay loaded; a mode change only flips visibility.
pub fn render_mode_system(
    mut params: ResMut<ViewerParams>,
    #[cfg(not(target_arch = "wasm32"))] keyboard: Res<ButtonInput<KeyCode>>,
) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let mut new_mode = None;

        if keyboard.just_pressed(KeyCode::KeyZ) {
            new_mode = Some(RenderMode::Surface);
        }
        if keyboard.just_pressed(KeyCode::KeyX) {
            new_mode = Some(RenderMode::Wiring);
        }
        if keyboard.just_pressed(KeyCode::KeyC) {
            new_mode = Some(RenderMode::Both);
        }

        if let Some(mode) = new_mode {
            if mode != params.render_mode {
                info!("Render mode: {}", mode.as_str());
                *params = params.with_render_mode(mode);
            }
        }
    }

    // On the web the mode arrives through `set_parameter`; nothing to poll.
    #[cfg(target_arch = "wasm32")]
    {
        if params.is_changed() && !params.is_added() {
            debug!("Render mode is {}", params.render_mode.as_str());
        }
    }
}

/// Apply the current mode to every surface and wiring sub-object.
pub fn apply_render_mode_visibility(
    params: Res<ViewerParams>,
    mut surfaces: Query<&mut Visibility, (With<BundleSurface>, Without<BundleWiring>)>,
    mut wirings: Query<&mut Visibility, (With<BundleWiring>, Without<BundleSurface>)>,
    added_surfaces: Query<(), Added<BundleSurface>>,
    added_wirings: Query<(), Added<BundleWiring>>,
) {
    if !params.is_changed() && added_surfaces.is_empty() && added_wirings.is_empty() {
        return;
    }

    let mode = params.render_mode;
    for mut visibility in &mut surfaces {
        visibility.set_if_neq(visibility_for(mode.shows_surface()));
    }
    for mut visibility in &mut wirings {
        visibility.set_if_neq(visibility_for(mode.shows_wiring()));
    }
}
