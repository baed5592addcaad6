//! Core business logic modules

pub mod edge;
pub mod error;
pub mod kelly;
pub mod odds;

// Re-export commonly used types
pub use edge::{assess, calculate_edge, classify_edge, EdgeAssessment};
pub use error::{CoreError, CoreResult};
pub use kelly::{calculate_kelly_fraction, calculate_kelly_stake, BetSizing, KellyCalculator};
pub use odds::{remove_margin, MarginMethod};
