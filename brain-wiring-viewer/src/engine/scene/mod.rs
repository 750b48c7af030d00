//! Scene assembly under the single normalized root.
//!
//! The anatomy (or its placeholder) fixes the normalization; bundles and
//! functional networks are composed as children of the same root and are
//! discarded and rebuilt whenever their inputs change.

/// Normalized root entity and the anatomy-derived scale/translation.
pub mod normalization;

/// Anatomy model components, bounds measurement and shell material.
pub mod anatomy;

/// Procedural two-hemisphere shell used when no anatomy is available.
pub mod placeholder;

/// Sagittal cutaway of the anatomy meshes.
pub mod cutaway;

/// Bundle groups: surface scene plus wiring lines.
///
/// Planning is pure; the system spawns the plan and labels every primitive.
pub mod composer;

/// Functional network nodes and edges.
pub mod network_composer;

/// Hairline and screen-space wide line primitives.
pub mod lines;

/// Wide line material and its viewport resolution uniform.
pub mod wide_line;

/// Ambient, key and fill lights.
pub mod lighting;
