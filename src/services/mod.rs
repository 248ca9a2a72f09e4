//! Service layer over the core pattern table.
//!
//! Services take an immutable pattern snapshot, run one computation to
//! completion, and return plain data or bytes. They never retain the pattern
//! and perform no I/O beyond the animation's scoped temp file.
//!
//! - [`validation`]: timing-quality metrics and the combined report.
//! - [`animation`]: firing order and the timing GIF artifact.

pub mod animation;
pub mod validation;

pub use animation::{firing_order, render_timing_gif, AnimationOptions};
pub use validation::{
    analyze_pattern, delay_continuity, gap_overlap_map, symmetry_score, AnalysisParams,
    ContinuityReport, GapEntry, ValidationReport,
};
