use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid pillar weights: {0}")]
    InvalidWeights(String),

    #[error("decay window must be a positive number of days, got {0}")]
    InvalidDecay(f64),

    #[error("default confidence must lie in (0, 1], got {0}")]
    InvalidConfidence(f64),

    #[error("invalid band thresholds: {0}")]
    InvalidBands(String),

    #[error("invalid tolerance: {0}")]
    InvalidTolerance(String),

    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
