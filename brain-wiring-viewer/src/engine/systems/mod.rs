//! Runtime systems driven by the viewer parameters and user input.
//!
//! Parameter snapshots are diffed once per change; each system below reacts
//! to the part of the diff it owns.

/// Parameter diffing: pack reloads and recomposition requests.
pub mod parameters;

/// Render mode switching between surface, wiring and both.
///
/// Keyboard input (native) or `set_parameter` over RPC (WASM).
pub mod render_mode;

/// Opacity, stroke width and glow applied to existing materials.
pub mod style;

/// Native keyboard shortcuts for the registered controls.
pub mod keyboard;

/// Pack status and citation overlay.
pub mod status_overlay;

/// Still image export of the rendered frame.
pub mod snapshot;
