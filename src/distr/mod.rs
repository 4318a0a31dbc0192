/// Univariate gaussian distribution and the Normal priors attached to every
/// model parameter (location coefficients and noise precision alike).
pub mod normal;

pub use normal::*;
