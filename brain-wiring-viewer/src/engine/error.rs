//! Error taxonomy for pack loading and scene composition.
//!
//! Fetch and load failures are caught at the pack-load boundary and turned
//! into status text. Data inconsistencies are logged per item and skipped.

use thiserror::Error;

/// Network or HTTP failure while retrieving manifest or payload JSON.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} while fetching {url}")]
    Status {
        /// Resolved request URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request never produced a response
    #[error("request for {url} failed: {reason}")]
    Transport {
        /// Resolved request URL
        url: String,
        /// Transport-level reason
        reason: String,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// An asset was fetched but could not be turned into something renderable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// JSON that fails to parse or validate
    #[error("could not decode {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Mesh asset rejected by the asset server
    #[error("mesh asset {url} failed to load: {reason}")]
    Asset { url: String, reason: String },

    /// Scene spawned without any measurable geometry
    #[error("mesh asset {url} contains no geometry")]
    EmptyScene { url: String },
}

/// A reference inside otherwise valid data failed to resolve. Never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataInconsistencyError {
    #[error("network {network}: edge {from} -> {to} references an unknown node")]
    UnknownEdgeEndpoint {
        network: String,
        from: String,
        to: String,
    },

    #[error("bundle {bundle}: polyline {index} has {points} point(s), need at least 2")]
    DegeneratePolyline {
        bundle: String,
        index: usize,
        points: usize,
    },

    #[error("bundle {bundle}: normalized wiring leaves the [-0.5, 0.5] cube")]
    OutOfNormalizedRange { bundle: String },

    #[error("bundle id {id} appears more than once in the manifest")]
    DuplicateBundleId { id: String },
}

/// Failure of a whole pack load, converted into a status message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Rejected parameter update from the control interface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("unknown parameter '{0}'")]
    Unknown(String),

    #[error("invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}
