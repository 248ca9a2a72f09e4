//! Explicit session state.
//!
//! One design session = one working pattern, its history, and the design
//! parameters the analysis consumes. The session owns all of it; operations
//! borrow the pattern for the duration of one computation and never retain
//! it. This replaces the implicit shared context of the original workflow
//! with a struct the caller passes around.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algorithms::kriging::{EstimatedSurface, KrigingEstimator, VariogramModel};
use crate::config::SessionConfig;
use crate::design::charge::ChargePlan;
use crate::error::BlastResult;
use crate::services::animation::{render_timing_gif, AnimationOptions};
use crate::services::validation::{analyze_pattern, AnalysisParams, ValidationReport};
use crate::store::store::PatternStore;

/// Design parameters shared across the session's analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignParams {
    /// Nominal hole spacing (m).
    pub spacing: f64,
    /// Nominal burden (m).
    pub burden: f64,
    pub variogram_model: VariogramModel,
    /// Color scale for the presentation layer; the computations never read
    /// it.
    pub color_scale: String,
    pub max_delay_jump: f64,
    pub symmetry_tolerance: f64,
    pub grid_resolution: usize,
}

impl DesignParams {
    fn from_config(config: &SessionConfig) -> Self {
        let variogram_model = VariogramModel::from_str(&config.analysis.variogram_model)
            .unwrap_or_else(|e| {
                log::warn!("{}; falling back to exponential", e);
                VariogramModel::Exponential
            });
        Self {
            spacing: config.analysis.spacing,
            burden: config.analysis.burden,
            variogram_model,
            color_scale: config.analysis.color_scale.clone(),
            max_delay_jump: config.analysis.max_delay_jump,
            symmetry_tolerance: config.analysis.symmetry_tolerance,
            grid_resolution: config.analysis.grid_resolution,
        }
    }
}

/// The session: store plus design parameters.
pub struct SessionState {
    pub store: PatternStore,
    pub params: DesignParams,
    animation: AnimationOptions,
}

impl SessionState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            store: PatternStore::new(config.store.clone()),
            params: DesignParams::from_config(config),
            animation: AnimationOptions {
                fps: config.animation.fps,
                frame_duration_ms: config.animation.frame_duration_ms,
                canvas_px: config.animation.canvas_px,
                budget: None,
            },
        }
    }

    /// Adopt the burden and spacing derived by the charge calculator as the
    /// session's nominal design density.
    pub fn apply_charge_plan(&mut self, plan: &ChargePlan) {
        log::info!(
            "adopting charge plan: burden {:.2} m, spacing {:.2} m",
            plan.burden_m,
            plan.spacing_m
        );
        self.burden_spacing(plan.burden_m, plan.spacing_m);
    }

    pub fn burden_spacing(&mut self, burden: f64, spacing: f64) {
        self.params.burden = burden;
        self.params.spacing = spacing;
    }

    /// Timing-quality report for the current pattern.
    pub fn analyze(&self) -> BlastResult<ValidationReport> {
        let params = AnalysisParams {
            spacing: self.params.spacing,
            burden: self.params.burden,
            max_delay_jump: self.params.max_delay_jump,
            symmetry_tolerance: self.params.symmetry_tolerance,
        };
        analyze_pattern(self.store.current(), &params)
    }

    /// Kriged delay surface for the current pattern, using the session's
    /// model and resolution.
    pub fn estimate_surface(&self, budget: Option<Duration>) -> BlastResult<EstimatedSurface> {
        KrigingEstimator::fit(self.store.current(), self.params.variogram_model)?
            .predict_grid(self.params.grid_resolution, budget)
    }

    /// Firing-sequence GIF for the current pattern.
    pub fn render_animation(&self, budget: Option<Duration>) -> BlastResult<Vec<u8>> {
        let options = AnimationOptions {
            budget,
            ..self.animation.clone()
        };
        render_timing_gif(self.store.current(), &options)
    }
}
