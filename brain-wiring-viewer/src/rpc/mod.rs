//! JSON-RPC 2.0 control interface for embedding the viewer in a web page.
//!
//! Implements bidirectional messaging between Bevy engine and the host page via
//! iframe postMessage, supporting both request-response and notification patterns.
//!
//! ## Architecture
//!
//! The RPC system uses standard JSON-RPC 2.0 protocol with:
//! - **Requests**: Expect responses with matching IDs
//! - **Notifications**: One-way messages without responses
//! - **Responses**: Reply to requests with results or errors
//!
//! ## Message Flow
//!
//! ```text
//! Host page (parent window)  <──postMessage──>  Viewer (iframe)
//!        │                                        │
//!        ├─ set_parameter {name, value} ────────> │
//!        │                                        ├─ ViewerParams::with_parameter
//!        │                                        ├─ new snapshot replaces the resource
//!        │ <──────────── Response (new snapshot) ─┤
//!        │                                        │
//!        │ <────── status_changed / hover_label ──┤
//! ```
//!
//! Handlers never touch the world directly. `handle_rpc_request()` reads an
//! `RpcContext` and returns `RpcAction`s, which the calling system turns into
//! parameter updates and events (`LoadPack`, `FrameView`, `SnapshotRequest`).
//!
//! ## Error Handling
//!
//! - `-32601`: Method not found
//! - `-32602`: Invalid params, including every `ParamError`
//! - `-32603`: Internal error
//!
//! ## Existing Methods
//!
//! ### Parameters
//! - `get_parameters`: Current parameter snapshot
//! - `set_parameter`: Replace one parameter (`{name, value}`); invalid names
//!   or values return `-32602`
//! - `list_controls`: Registered controls with ranges, options and labels
//!
//! ### Packs
//! - `load_pack`: Switch to a pack tag, or reload when it is already current
//! - `reload_pack`: Reload the current pack
//! - `get_pack_info`: Tag, version, citation, notes and bundle list
//!
//! ### View
//! - `frame_view`: Frame everything currently visible
//! - `snapshot`: Save a still image of the next frame
//!
//! ### Notifications
//! - `status_changed`: Pack status line changed
//! - `pack_loaded`: Manifest accepted for the current load
//! - `hover_label`: Label under the pointer (`null` when none)
//! - `snapshot_saved`: Still image written

/// JSON-RPC 2.0 bidirectional communication with the host page.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
