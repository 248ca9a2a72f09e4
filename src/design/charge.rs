//! Explosive charge mass calculations.
//!
//! Rule-of-thumb formulas for bench and cut-hole charging. Inputs are SI
//! except hole diameter (mm, as drilled bits are specified) and explosive
//! density (g/cm³, as products are specified).

use serde::{Deserialize, Serialize};

use crate::config::ChargeSettings;

/// Nominal rock density, t/m³.
pub const ROCK_DENSITY_T_M3: f64 = 2.7;

/// Nominal powder factor, kg/t.
pub const POWDER_FACTOR_KG_T: f64 = 0.45;

/// Default spacing-to-burden ratio.
pub const SPACING_BURDEN_RATIO: f64 = 1.15;

/// Linear charge concentration along the hole, kg/m.
pub fn linear_charge(explosive_density: f64, hole_diameter_mm: f64) -> f64 {
    explosive_density * hole_diameter_mm.powi(2) / 1273.0
}

/// Linear charge required to break out a cut hole, kg/m.
///
/// `open_hole_diameter` and `cc_distance` (center-to-center distance between
/// the open hole and the charged hole) share one length unit.
pub fn required_linear_charge(open_hole_diameter: f64, cc_distance: f64) -> f64 {
    1.67e-3
        * (cc_distance / open_hole_diameter).powf(1.5)
        * (cc_distance - open_hole_diameter / 2.0)
}

/// Charge mass per hole, kg.
pub fn hole_charge_mass(linear_charge_kg_m: f64, charge_length_m: f64) -> f64 {
    linear_charge_kg_m * charge_length_m
}

/// Charge mass for the entire blast, kg.
pub fn total_charge_mass(charge_mass_per_hole: f64, hole_count: u32) -> f64 {
    charge_mass_per_hole * f64::from(hole_count)
}

/// Spacing from burden via the spacing-to-burden ratio, m.
pub fn spacing_from_burden(burden_m: f64, sp_ratio: f64) -> f64 {
    sp_ratio * burden_m
}

/// Burden estimate from charge geometry, m.
pub fn burden_estimate(
    charge_length_m: f64,
    linear_charge_kg_m: f64,
    hole_depth_m: f64,
    powder_factor: f64,
    sp_ratio: f64,
) -> f64 {
    ((linear_charge_kg_m * charge_length_m) / (sp_ratio * hole_depth_m * powder_factor)).sqrt()
}

/// Inputs to a full charge plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeInputs {
    pub hole_diameter_mm: f64,
    pub hole_depth_m: f64,
    pub explosive_density: f64,
    pub stemming_length_m: f64,
    pub hole_count: u32,
}

impl ChargeInputs {
    /// Inputs seeded from configuration defaults.
    pub fn from_settings(settings: &ChargeSettings, hole_count: u32) -> Self {
        Self {
            hole_diameter_mm: settings.hole_diameter_mm,
            hole_depth_m: settings.hole_depth_m,
            explosive_density: settings.explosive_density,
            stemming_length_m: settings.stemming_length_m,
            hole_count,
        }
    }
}

/// Derived charge plan: masses plus the burden/spacing the pattern should be
/// laid out with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargePlan {
    pub charge_length_m: f64,
    pub linear_charge_kg_m: f64,
    pub charge_per_hole_kg: f64,
    pub total_charge_kg: f64,
    pub burden_m: f64,
    pub spacing_m: f64,
}

impl ChargePlan {
    /// Compute the full plan. Charge length is hole depth minus stemming.
    pub fn compute(inputs: &ChargeInputs) -> Self {
        let charge_length_m = inputs.hole_depth_m - inputs.stemming_length_m;
        let linear_charge_kg_m = linear_charge(inputs.explosive_density, inputs.hole_diameter_mm);
        let charge_per_hole_kg = hole_charge_mass(linear_charge_kg_m, charge_length_m);
        let total_charge_kg = total_charge_mass(charge_per_hole_kg, inputs.hole_count);
        let burden_m = burden_estimate(
            charge_length_m,
            linear_charge_kg_m,
            inputs.hole_depth_m,
            POWDER_FACTOR_KG_T,
            SPACING_BURDEN_RATIO,
        );
        let spacing_m = spacing_from_burden(burden_m, SPACING_BURDEN_RATIO);

        Self {
            charge_length_m,
            linear_charge_kg_m,
            charge_per_hole_kg,
            total_charge_kg,
            burden_m,
            spacing_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_charge_matches_formula() {
        // rho * d^2 / 1273 with the stock 51 mm / 1.15 g/cm3 inputs.
        let lin = linear_charge(1.15, 51.0);
        assert!((lin - 1.15 * 51.0 * 51.0 / 1273.0).abs() < 1e-12);
        assert!((lin - 2.3497).abs() < 1e-3);
    }

    #[test]
    fn plan_is_consistent() {
        let inputs = ChargeInputs {
            hole_diameter_mm: 51.0,
            hole_depth_m: 4.0,
            explosive_density: 1.15,
            stemming_length_m: 0.51,
            hole_count: 62,
        };
        let plan = ChargePlan::compute(&inputs);

        assert!((plan.charge_length_m - 3.49).abs() < 1e-12);
        assert!((plan.charge_per_hole_kg - plan.linear_charge_kg_m * 3.49).abs() < 1e-12);
        assert!((plan.total_charge_kg - plan.charge_per_hole_kg * 62.0).abs() < 1e-9);
        // Spacing follows burden by the fixed ratio.
        assert!((plan.spacing_m - plan.burden_m * SPACING_BURDEN_RATIO).abs() < 1e-12);
        assert!(plan.burden_m > 0.0);
    }

    #[test]
    fn required_linear_charge_grows_with_distance() {
        let near = required_linear_charge(102.0, 150.0);
        let far = required_linear_charge(102.0, 300.0);
        assert!(far > near);
        assert!(near > 0.0);
    }
}
