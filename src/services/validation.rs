//! Blast-timing validation.
//!
//! Three deterministic metrics over the working pattern, reported as data
//! rather than errors: a single bad delay is a finding, not a failure. The
//! validator only fails hard on structurally unusable input (an empty
//! pattern).
//!
//! Holes are examined in table order; the table is expected to already be
//! listed in firing-relevant order, so the continuity check reads the delay
//! column as a sequence.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::domain::Pattern;
use crate::error::{BlastError, BlastResult};

/// Parameters for a full analysis pass.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisParams {
    /// Nominal hole spacing (m).
    pub spacing: f64,
    /// Nominal burden (m).
    pub burden: f64,
    /// Largest tolerated |Δdelay| between successive rows.
    pub max_delay_jump: f64,
    /// Match radius (m) for the symmetry reflection test.
    pub symmetry_tolerance: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            spacing: 1.0,
            burden: 1.1,
            max_delay_jump: 2.0,
            symmetry_tolerance: 1e-6,
        }
    }
}

/// Result of the sequential delay continuity check.
#[derive(Debug, Clone, Serialize)]
pub struct ContinuityReport {
    pub ok: bool,
    /// Violating row index (the later row of the offending pair) mapped to
    /// the signed delay delta that exceeded the threshold.
    pub violations: BTreeMap<usize, f64>,
    pub max_jump: f64,
}

/// Per-hole nearest-neighbor density entry.
#[derive(Debug, Clone, Serialize)]
pub struct GapEntry {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    /// Distance to the nearest other hole; NaN for a single-hole pattern.
    pub min_dist: f64,
    /// `min_dist / min(spacing, burden)`. Near 1.0 matches nominal design
    /// density; well below 1.0 signals overlap risk, well above signals
    /// under-density. NaN for a single-hole pattern.
    pub gap_ratio: f64,
}

/// Combined timing-quality report, recomputed on every analysis request.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub continuity: ContinuityReport,
    pub gaps: Vec<GapEntry>,
    /// Fraction of holes whose centroid reflection lands on another hole.
    pub symmetry_score: f64,
}

impl ValidationReport {
    /// Smallest finite gap ratio, skipping the NaN sentinel. NaN when no
    /// finite ratio exists.
    pub fn min_gap_ratio(&self) -> f64 {
        let min = self
            .gaps
            .iter()
            .map(|g| g.gap_ratio)
            .filter(|r| !r.is_nan())
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            min
        } else {
            f64::NAN
        }
    }
}

/// Check that successive delays never jump by more than `max_jump`.
///
/// A pattern with one hole has no successive pairs and is trivially ok.
pub fn delay_continuity(pattern: &Pattern, max_jump: f64) -> BlastResult<ContinuityReport> {
    if pattern.is_empty() {
        return Err(BlastError::EmptyPattern("delay continuity"));
    }

    let mut violations = BTreeMap::new();
    let points = pattern.points();
    for i in 1..points.len() {
        let delta = points[i].delay - points[i - 1].delay;
        if delta.abs() > max_jump {
            violations.insert(i, delta);
        }
    }

    Ok(ContinuityReport {
        ok: violations.is_empty(),
        violations,
        max_jump,
    })
}

/// Nearest-neighbor distance and gap ratio for every hole.
pub fn gap_overlap_map(
    pattern: &Pattern,
    spacing: f64,
    burden: f64,
) -> BlastResult<Vec<GapEntry>> {
    if pattern.is_empty() {
        return Err(BlastError::EmptyPattern("gap/overlap analysis"));
    }

    let nominal = spacing.min(burden);
    let points = pattern.points();
    let entries = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let min_dist = points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, q)| p.distance_to(q))
                .fold(f64::NAN, f64::min);
            GapEntry {
                index: i,
                x: p.x,
                y: p.y,
                min_dist,
                gap_ratio: min_dist / nominal,
            }
        })
        .collect();

    Ok(entries)
}

/// Fraction of holes whose reflection through the centroid coincides with
/// another hole, matched within `tolerance` meters.
///
/// The tolerance matters: after any arithmetic transform, coordinates rarely
/// compare equal bit-for-bit, so an exact match would under-count heavily.
pub fn symmetry_score(pattern: &Pattern, tolerance: f64) -> BlastResult<f64> {
    if pattern.is_empty() {
        return Err(BlastError::EmptyPattern("symmetry score"));
    }

    let (cx, cy) = pattern.centroid().expect("non-empty pattern");
    let points = pattern.points();
    let matches = points
        .iter()
        .filter(|p| {
            let rx = 2.0 * cx - p.x;
            let ry = 2.0 * cy - p.y;
            points
                .iter()
                .any(|q| ((q.x - rx).powi(2) + (q.y - ry).powi(2)).sqrt() <= tolerance)
        })
        .count();

    Ok(matches as f64 / points.len() as f64)
}

/// Run all three checks and bundle the report.
pub fn analyze_pattern(
    pattern: &Pattern,
    params: &AnalysisParams,
) -> BlastResult<ValidationReport> {
    let continuity = delay_continuity(pattern, params.max_delay_jump)?;
    let gaps = gap_overlap_map(pattern, params.spacing, params.burden)?;
    let symmetry = symmetry_score(pattern, params.symmetry_tolerance)?;

    if !continuity.ok {
        log::debug!(
            "delay continuity failed with {} violation(s)",
            continuity.violations.len()
        );
    }

    Ok(ValidationReport {
        continuity,
        gaps,
        symmetry_score: symmetry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::Point;

    fn line_pattern(delays: &[f64]) -> Pattern {
        Pattern::from_points(
            delays
                .iter()
                .enumerate()
                .map(|(i, &d)| Point::new(i as f64 * 10.0, 0.0, d))
                .collect(),
        )
    }

    #[test]
    fn monotone_delays_pass_continuity() {
        let report = delay_continuity(&line_pattern(&[0.0, 1.0, 2.0]), 2.0).unwrap();
        assert!(report.ok);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn jump_is_reported_at_the_later_row() {
        // Raising the middle delay to 5 breaks both adjacent pairs.
        let report = delay_continuity(&line_pattern(&[0.0, 5.0, 2.0]), 2.0).unwrap();
        assert!(!report.ok);
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.violations[&1], 5.0);
        assert_eq!(report.violations[&2], -3.0);
        assert_eq!(report.max_jump, 2.0);
    }

    #[test]
    fn single_hole_is_trivially_continuous() {
        let report = delay_continuity(&line_pattern(&[7.0]), 2.0).unwrap();
        assert!(report.ok);
    }

    #[test]
    fn empty_pattern_is_an_error() {
        assert!(matches!(
            delay_continuity(&Pattern::new(), 2.0),
            Err(BlastError::EmptyPattern(_))
        ));
        assert!(matches!(
            gap_overlap_map(&Pattern::new(), 1.0, 1.0),
            Err(BlastError::EmptyPattern(_))
        ));
        assert!(matches!(
            symmetry_score(&Pattern::new(), 1e-6),
            Err(BlastError::EmptyPattern(_))
        ));
    }

    #[test]
    fn two_hole_gap_ratio_is_distance_over_nominal() {
        let pattern = Pattern::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(3.0, 0.0, 1.0),
        ]);
        let gaps = gap_overlap_map(&pattern, 2.0, 2.0).unwrap();
        assert_eq!(gaps.len(), 2);
        for entry in &gaps {
            assert_eq!(entry.min_dist, 3.0);
            assert_eq!(entry.gap_ratio, 1.5);
        }
    }

    #[test]
    fn nominal_is_the_smaller_of_spacing_and_burden() {
        let pattern = Pattern::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 1.0),
        ]);
        let gaps = gap_overlap_map(&pattern, 5.0, 2.0).unwrap();
        assert_eq!(gaps[0].gap_ratio, 2.0);
    }

    #[test]
    fn single_hole_reports_nan_sentinel() {
        let gaps = gap_overlap_map(&line_pattern(&[0.0]), 1.0, 1.0).unwrap();
        assert!(gaps[0].min_dist.is_nan());
        assert!(gaps[0].gap_ratio.is_nan());
    }

    #[test]
    fn coincident_holes_have_zero_gap() {
        let pattern = Pattern::from_points(vec![
            Point::new(1.0, 1.0, 0.0),
            Point::new(1.0, 1.0, 1.0),
            Point::new(9.0, 9.0, 2.0),
        ]);
        let gaps = gap_overlap_map(&pattern, 1.0, 1.0).unwrap();
        assert_eq!(gaps[0].min_dist, 0.0);
        assert_eq!(gaps[0].gap_ratio, 0.0);
    }

    #[test]
    fn square_is_perfectly_symmetric() {
        let pattern = Pattern::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(10.0, 0.0, 1.0),
            Point::new(10.0, 10.0, 2.0),
            Point::new(0.0, 10.0, 3.0),
        ]);
        assert_eq!(symmetry_score(&pattern, 1e-6).unwrap(), 1.0);
    }

    #[test]
    fn asymmetric_triangle_scores_below_one() {
        let pattern = Pattern::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(7.0, 1.0, 1.0),
            Point::new(2.0, 6.0, 2.0),
        ]);
        let score = symmetry_score(&pattern, 1e-6).unwrap();
        assert!(score < 1.0);
    }

    #[test]
    fn tolerance_absorbs_floating_point_drift() {
        // A square whose coordinates went through a rotate/unrotate round
        // trip: still symmetric, but no longer bit-exact.
        let theta: f64 = 0.3;
        let jitter = |x: f64, y: f64| {
            let (s, c) = theta.sin_cos();
            let (rx, ry) = (x * c - y * s, x * s + y * c);
            (rx * c + ry * s, -rx * s + ry * c)
        };
        let points = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                let (jx, jy) = jitter(x, y);
                Point::new(jx, jy, i as f64)
            })
            .collect();
        let pattern = Pattern::from_points(points);
        assert_eq!(symmetry_score(&pattern, 1e-6).unwrap(), 1.0);
    }

    #[test]
    fn report_min_gap_ratio_skips_nan() {
        let report = analyze_pattern(&line_pattern(&[0.0]), &AnalysisParams::default()).unwrap();
        assert!(report.min_gap_ratio().is_nan());

        let report =
            analyze_pattern(&line_pattern(&[0.0, 1.0, 2.0]), &AnalysisParams::default()).unwrap();
        assert_eq!(report.min_gap_ratio(), 10.0);
    }
}
