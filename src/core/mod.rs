//! Core domain models for blast patterns.
//!
//! This module defines the fundamental data structures used throughout the
//! crate: blast-hole points, the ordered pattern table, and the wall-clock
//! budget guard applied to CPU-bound computations.

pub mod deadline;
pub mod domain;

pub use deadline::Deadline;
pub use domain::{BoundingBox, Pattern, Point};
