//! Interactive 3D viewer for neuroanatomy wiring diagrams.
//!
//! A versioned data pack supplies an anatomy model and tract bundles; the
//! viewer normalizes everything into one display frame, overlays built-in
//! functional networks and resolves tooltips by picking.

pub mod engine;
pub mod rpc;
pub mod tools;
