//! Pack data model for anatomy, tract bundles and functional networks.
//!
//! Handles manifest decoding, bundle payloads, the built-in network
//! catalogue, bounds and asset location resolution.

/// Spatial bounds used for normalization and camera framing.
pub mod bounds;

/// Wiring payloads: polylines per bundle in the pack's wiring space.
pub mod bundle_payload;

/// Pack-relative path resolution and cache defeat for JSON requests.
pub mod location;

/// Built-in functional network catalogue.
pub mod networks;

/// Versioned pack manifest with legacy bundle shapes resolved at decode time.
pub mod pack_manifest;
