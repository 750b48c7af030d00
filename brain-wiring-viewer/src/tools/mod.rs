//! Interactive tools layered over the composed scene.
//!
//! ## Picking
//!
//! Every pointer move produces a fresh world ray from the active camera:
//!
//! ```text
//! CursorMoved
//!   └─> update_hover()
//!       ├─> pointer_to_ndc() / ndc_to_ray()
//!       ├─> nearest_hit() over visible ComposedContent
//!       │     ├─ lines: segment distance within a pixel tolerance
//!       │     ├─ nodes: sphere
//!       │     └─ surfaces: mesh triangles
//!       ├─> resolve_label(): self, parent, grandparent
//!       └─> HoverState
//!           ├─> update_tooltip()
//!           └─> hover_label RPC notification
//! ```
//!
//! No hit is cached between pointer moves. A miss, or a hit without a label
//! within two ownership levels, hides the tooltip.

/// Pointer picking, label resolution and the hover tooltip.
pub mod picking;
