pub mod check;
pub mod engine;
pub mod metrics;
pub mod validation;

pub use check::{check_metrics, check_validation};
pub use engine::{compute_metrics, compute_validation_metrics, ScorecardEngine, SubjectScorecard};
pub use esg_score_core::*;
pub use metrics::*;
pub use validation::*;
