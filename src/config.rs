//! Session configuration file support.
//!
//! This module provides the tunable policies and defaults for a design
//! session, loadable from a TOML file. Every field has a default matching the
//! original workflow, so an empty file (or no file at all) yields a working
//! configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BlastError, BlastResult};

/// Session configuration from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub charge: ChargeSettings,
    #[serde(default)]
    pub animation: AnimationSettings,
}

/// Point-table mutation policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Minimum distance (m) a new or edited hole must keep from every other
    /// hole.
    #[serde(default = "default_min_separation")]
    pub min_separation: f64,
    /// Reject holes whose delay duplicates an existing hole's delay.
    #[serde(default)]
    pub unique_delay: bool,
    /// Reject holes with a negative delay.
    #[serde(default = "default_true")]
    pub reject_negative_delay: bool,
    /// Undo history depth (full-pattern snapshots; oldest evicted first).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

/// Timing analysis and estimation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Largest tolerated |Δdelay| between successive table rows.
    #[serde(default = "default_max_delay_jump")]
    pub max_delay_jump: f64,
    /// Match radius (m) for the centro-symmetry reflection test.
    #[serde(default = "default_symmetry_tolerance")]
    pub symmetry_tolerance: f64,
    /// Estimation grid resolution per axis.
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: usize,
    /// Variogram model name: exponential, spherical, gaussian, linear, power.
    #[serde(default = "default_variogram_model")]
    pub variogram_model: String,
    /// Color scale for the presentation layer; carried through untouched,
    /// the computations never read it.
    #[serde(default = "default_color_scale")]
    pub color_scale: String,
    /// Nominal hole spacing (m) used for gap ratios.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    /// Nominal burden (m) used for gap ratios.
    #[serde(default = "default_burden")]
    pub burden: f64,
}

/// Charge calculator defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeSettings {
    #[serde(default = "default_hole_diameter_mm")]
    pub hole_diameter_mm: f64,
    #[serde(default = "default_explosive_density")]
    pub explosive_density: f64,
    #[serde(default = "default_hole_depth_m")]
    pub hole_depth_m: f64,
    #[serde(default = "default_stemming_length_m")]
    pub stemming_length_m: f64,
}

/// Animation render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationSettings {
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Per-frame duration in milliseconds. Overrides `fps` when set.
    #[serde(default)]
    pub frame_duration_ms: Option<u32>,
    /// Square canvas edge in pixels.
    #[serde(default = "default_canvas_px")]
    pub canvas_px: u32,
}

fn default_min_separation() -> f64 {
    0.5
}

fn default_history_capacity() -> usize {
    30
}

fn default_max_delay_jump() -> f64 {
    2.0
}

fn default_symmetry_tolerance() -> f64 {
    1e-6
}

fn default_grid_resolution() -> usize {
    100
}

fn default_variogram_model() -> String {
    "exponential".to_string()
}

fn default_color_scale() -> String {
    "viridis".to_string()
}

fn default_spacing() -> f64 {
    1.0
}

fn default_burden() -> f64 {
    1.1
}

fn default_hole_diameter_mm() -> f64 {
    51.0
}

fn default_explosive_density() -> f64 {
    1.15
}

fn default_hole_depth_m() -> f64 {
    4.0
}

fn default_stemming_length_m() -> f64 {
    0.51
}

fn default_fps() -> u32 {
    2
}

fn default_canvas_px() -> u32 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            min_separation: default_min_separation(),
            unique_delay: false,
            reject_negative_delay: true,
            history_capacity: default_history_capacity(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_delay_jump: default_max_delay_jump(),
            symmetry_tolerance: default_symmetry_tolerance(),
            grid_resolution: default_grid_resolution(),
            variogram_model: default_variogram_model(),
            color_scale: default_color_scale(),
            spacing: default_spacing(),
            burden: default_burden(),
        }
    }
}

impl Default for ChargeSettings {
    fn default() -> Self {
        Self {
            hole_diameter_mm: default_hole_diameter_mm(),
            explosive_density: default_explosive_density(),
            hole_depth_m: default_hole_depth_m(),
            stemming_length_m: default_stemming_length_m(),
        }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            frame_duration_ms: None,
            canvas_px: default_canvas_px(),
        }
    }
}

impl SessionConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> BlastResult<Self> {
        toml::from_str(content)
            .map_err(|e| BlastError::Codec(format!("failed to parse config: {}", e)))
    }

    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> BlastResult<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| BlastError::Codec(format!("failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the default location (`blast.toml` in the
    /// current or parent directory), falling back to defaults when no file
    /// exists.
    pub fn from_default_location() -> Self {
        let search_paths = [PathBuf::from("blast.toml"), PathBuf::from("../blast.toml")];
        for path in search_paths {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        log::warn!("ignoring unreadable config {}: {}", path.display(), e);
                    }
                }
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config.store.min_separation, 0.5);
        assert_eq!(config.store.history_capacity, 30);
        assert!(!config.store.unique_delay);
        assert!(config.store.reject_negative_delay);
        assert_eq!(config.analysis.max_delay_jump, 2.0);
        assert_eq!(config.analysis.grid_resolution, 100);
        assert_eq!(config.analysis.variogram_model, "exponential");
        assert_eq!(config.charge.hole_diameter_mm, 51.0);
        assert_eq!(config.animation.fps, 2);
    }

    #[test]
    fn partial_toml_overrides_selected_fields() {
        let toml = r#"
[store]
min_separation = 1.25
unique_delay = true

[analysis]
max_delay_jump = 4.0
variogram_model = "spherical"
"#;
        let config = SessionConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.store.min_separation, 1.25);
        assert!(config.store.unique_delay);
        // Untouched sections keep their defaults.
        assert_eq!(config.store.history_capacity, 30);
        assert_eq!(config.analysis.max_delay_jump, 4.0);
        assert_eq!(config.analysis.variogram_model, "spherical");
        assert_eq!(config.charge.explosive_density, 1.15);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let result = SessionConfig::from_toml_str("[store\nmin_separation = ");
        assert!(result.is_err());
    }
}
