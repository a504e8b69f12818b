pub mod aggregate;
pub mod claim;
pub mod config;
pub mod error;
pub mod normalize;
pub mod percentile;
pub mod pillar;

pub use aggregate::*;
pub use claim::*;
pub use config::*;
pub use error::ScoringError;
pub use normalize::*;
pub use percentile::*;
pub use pillar::*;
