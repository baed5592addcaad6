//! Probability model for at-least-one player-prop markets
//!
//! Converts per-90 performance rates and multiplicative adjustment factors
//! into a match intensity λ, a Poisson P(X ≥ 1) and fair decimal odds.

pub mod assist;
pub mod form;
pub mod goalscorer;
pub mod poisson;

pub use assist::{
    calculate_assist_price, calculate_creation_score, AssistInput, CreationMetrics, CreationScore,
    LeagueAverages,
};
pub use form::{calculate_form_factor, per_90};
pub use goalscorer::{calculate_goalscorer_price, GoalscorerInput};
pub use poisson::{price, Factor, PricingExplanation, PricingInput, PricingResult, ProbabilityTier};
