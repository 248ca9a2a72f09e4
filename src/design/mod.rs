//! Blast engineering design inputs.
//!
//! This module covers the two front-of-pipeline design tools: explosive
//! charge mass calculations ([`charge`]) and blast-hole grid layout
//! generation ([`grid`]). Both feed the pattern table that the validation and
//! estimation components consume.

pub mod charge;
pub mod grid;

pub use charge::{ChargeInputs, ChargePlan};
pub use grid::GridSpec;
