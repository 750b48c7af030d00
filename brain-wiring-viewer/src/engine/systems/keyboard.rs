use crate::engine::assets::networks::NetworkCatalog;
use crate::engine::camera::framing::FrameView;
use crate::engine::core::params::ViewerParams;
use crate::engine::loading::pack_loader::LoadPack;
use crate::engine::loading::pack_session::PackSession;
use crate::engine::systems::snapshot::SnapshotRequest;
use bevy::prelude::*;
use constants::render_settings::{MAX_CUTAWAY, MAX_LINE_WIDTH_PX, MIN_LINE_WIDTH_PX};
use serde_json::json;

const DIGIT_KEYS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Native shortcuts for the registered controls.
///
/// - `F` frame view, `R` reload pack, `P` snapshot
/// - `G` glow, `E` dashed edges
/// - `[` / `]` cutaway, `,` / `.` line width
/// - `1`-`9` toggle bundles, with `Shift` toggle networks
///
/// Render mode (`Z`/`X`/`C`) lives in `render_mode_system`.
#[allow(clippy::too_many_arguments)]
pub fn handle_keyboard_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut params: ResMut<ViewerParams>,
    session: Res<PackSession>,
    catalog: Option<Res<NetworkCatalog>>,
    mut frame: EventWriter<FrameView>,
    mut reload: EventWriter<LoadPack>,
    mut snapshot: EventWriter<SnapshotRequest>,
) {
    if keyboard.just_pressed(KeyCode::KeyF) {
        frame.write(FrameView);
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        reload.write(LoadPack {
            tag: params.pack_tag.clone(),
        });
    }
    if keyboard.just_pressed(KeyCode::KeyP) {
        snapshot.write(SnapshotRequest);
    }

    let mut next = None;
    if keyboard.just_pressed(KeyCode::KeyG) {
        next = params.with_parameter("glow", &json!(!params.glow)).ok();
    }
    if keyboard.just_pressed(KeyCode::KeyE) {
        next = params.with_parameter("dashedEdges", &json!(!params.dashed_edges)).ok();
    }
    if keyboard.just_pressed(KeyCode::BracketLeft) || keyboard.just_pressed(KeyCode::BracketRight) {
        let step = if keyboard.just_pressed(KeyCode::BracketRight) { 0.05 } else { -0.05 };
        let cutaway = (params.cutaway + step).clamp(0.0, MAX_CUTAWAY);
        next = params.with_parameter("cutaway", &json!(cutaway)).ok();
    }
    if keyboard.just_pressed(KeyCode::Comma) || keyboard.just_pressed(KeyCode::Period) {
        let step = if keyboard.just_pressed(KeyCode::Period) { 0.5 } else { -0.5 };
        let width = (params.line_width_px + step).clamp(MIN_LINE_WIDTH_PX, MAX_LINE_WIDTH_PX);
        next = params.with_parameter("lineWidth", &json!(width)).ok();
    }

    let shift = keyboard.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]);
    for (index, key) in DIGIT_KEYS.iter().enumerate() {
        if !keyboard.just_pressed(*key) {
            continue;
        }
        if shift {
            if let Some(id) = catalog.as_ref().and_then(|c| c.networks.get(index)).map(|n| n.id.clone()) {
                next = Some(params.with_network_toggled(&id));
            }
        } else if let Some(bundle) = session.manifest().and_then(|m| m.bundles.get(index)) {
            next = Some(params.with_bundle_toggled(&bundle.id));
        }
    }

    if let Some(next) = next {
        if next != *params {
            *params = next;
        }
    }
}
