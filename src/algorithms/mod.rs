//! Numerical algorithms for blast-timing analysis.
//!
//! # Components
//!
//! - [`kriging`]: variogram fitting and ordinary-kriging estimation of a
//!   continuous delay surface over the pattern's bounding box.

pub mod kriging;

pub use kriging::{
    fit_and_predict_grid, fit_and_predict_point, EstimatedSurface, KrigingEstimator,
    VariogramModel,
};
