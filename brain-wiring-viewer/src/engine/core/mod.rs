//! Core application setup, configuration and parameters.
//!
//! Handles application lifecycle, window configuration, start-up
//! configuration and the immutable parameter snapshots every other
//! system reads.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Registers plugins, resources, events and the system schedule for both
/// native and WASM targets.
pub mod app_setup;

/// Loading/Running state and its transition.
pub mod app_state;

/// Start-up configuration from command-line arguments or the page URL.
pub mod config;

/// Viewer parameters, their diff and the control registry.
pub mod params;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
