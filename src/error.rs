//! Error types shared across the crate.

/// Result type for blast-design operations.
pub type BlastResult<T> = Result<T, BlastError>;

/// Error type for blast-design operations.
#[derive(Debug, thiserror::Error)]
pub enum BlastError {
    /// Import failed: required columns are absent from the header, or rows
    /// contained values that could not be coerced to numbers. `columns` names
    /// every offending column.
    #[error("missing or invalid columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// The estimator was given too few distinct points or a degenerate
    /// (collinear) geometry.
    #[error("insufficient data for estimation: {0}")]
    InsufficientData(String),

    /// A point index was outside the current table bounds.
    #[error("point index {index} out of range (pattern has {len} points)")]
    OutOfRange { index: usize, len: usize },

    /// A store mutation violated a validation rule. The payload names the
    /// rule, the threshold, and the actual value so the caller can correct it.
    #[error("validation rejected: {0}")]
    ValidationRejected(RuleViolation),

    /// A CPU-bound operation exceeded the caller's wall-clock budget.
    #[error("computation exceeded time budget of {budget_ms} ms")]
    ComputationTimeout { budget_ms: u64 },

    /// An operation that needs at least one point was invoked on an empty
    /// pattern.
    #[error("empty pattern: {0} requires at least one point")]
    EmptyPattern(&'static str),

    /// An artifact could not be encoded or decoded (CSV, GIF, or config
    /// serialization seam).
    #[error("codec error: {0}")]
    Codec(String),
}

/// A store validation rule that rejected a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleViolation {
    /// The new or edited point sits closer than the minimum separation to an
    /// existing hole.
    TooClose {
        min_separation: f64,
        actual: f64,
        nearest: usize,
    },
    /// Delay uniqueness is enforced and the delay is already taken.
    DuplicateDelay { delay: f64, existing: usize },
    /// Negative delays are rejected by policy.
    NegativeDelay { delay: f64 },
}

impl std::fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleViolation::TooClose {
                min_separation,
                actual,
                nearest,
            } => write!(
                f,
                "point is {:.3} m from hole {} (minimum separation {:.3} m)",
                actual, nearest, min_separation
            ),
            RuleViolation::DuplicateDelay { delay, existing } => write!(
                f,
                "delay {} is already assigned to hole {}",
                delay, existing
            ),
            RuleViolation::NegativeDelay { delay } => {
                write!(f, "delay must be non-negative, got {}", delay)
            }
        }
    }
}
