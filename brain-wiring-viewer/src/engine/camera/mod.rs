//! Orbit camera and on-demand framing.

/// Orbit camera resource and input controller.
pub mod viewport_camera;

/// Framing of the visible content's union bounds.
pub mod framing;
