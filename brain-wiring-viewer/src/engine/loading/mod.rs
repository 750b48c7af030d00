//! Pack loading and degradation.
//!
//! A load request bumps the session generation, fetches the manifest, then
//! fans out bundle payload fetches and the anatomy load. Results from an
//! older generation are discarded. Any single failure degrades only the
//! asset it belongs to.

/// HTTP/file fetching into a mailbox drained by the main schedule.
pub mod fetcher;

/// Load generation, manifest and payload state, status text.
pub mod pack_session;

/// `LoadPack` handling and fetch result application.
pub mod pack_loader;

/// Anatomy model loading, measurement and placeholder fallback.
pub mod anatomy_loader;

/// Built-in functional network catalogue.
pub mod catalog_loader;

/// `http`/`https` asset sources for absolute mesh URLs.
pub mod web_source;
