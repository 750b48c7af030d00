//! Shared compile-time settings for the wiring diagram viewer.

/// Axis conventions for authored anatomy, bundle and network coordinates.
pub mod coordinate_system;

/// Pack locations, file names and asset paths.
pub mod path;

/// Stroke, sizing, picking and framing defaults.
pub mod render_settings;
