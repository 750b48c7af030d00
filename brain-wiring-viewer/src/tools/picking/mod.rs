//! Pointer picking for tooltips.
//!
//! The pointer position is projected into a normalized-device ray, tested
//! against every visible composed primitive, and the nearest hit's label is
//! resolved through at most two ownership levels.

/// Pointer to ray conversion and ray/primitive intersection tests.
pub mod ray;

/// Candidate collection, nearest-hit selection and label resolution.
pub mod hit_test;

/// Tooltip text node that follows the pointer.
pub mod tooltip;
