//! Report rendering.

use crate::error::{BlastError, BlastResult};
use crate::services::validation::ValidationReport;

/// Render the downloadable text summary: exactly three lines.
///
/// ```text
/// Delay Continuity: PASS
/// Min Gap Ratio: 0.95
/// Symmetry Score: 100.00%
/// ```
pub fn render_report(report: &ValidationReport) -> String {
    format!(
        "Delay Continuity: {}\nMin Gap Ratio: {:.2}\nSymmetry Score: {:.2}%",
        if report.continuity.ok { "PASS" } else { "FAIL" },
        report.min_gap_ratio(),
        report.symmetry_score * 100.0,
    )
}

/// Serialize the full report as pretty JSON.
pub fn report_to_json(report: &ValidationReport) -> BlastResult<String> {
    serde_json::to_string_pretty(report)
        .map_err(|e| BlastError::Codec(format!("report json: {}", e)))
}
