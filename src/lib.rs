/// Typed observations (temperature, pressure, strength), delimited-table
/// loading and seeded uniform subsampling without replacement.
pub mod sample;

/// Univariate gaussian distribution and the Normal priors attached to model
/// parameters, with positive-precision validation.
pub mod distr;

/// Point estimation by ordinary least squares, used to center the Bayesian
/// coefficient priors at frequentist estimates.
pub mod fit;

/// Structured model configuration: named priors plus the likelihood relation
/// (linear or ratio design), serializable to JSON.
pub mod model;

/// Posterior simulation: retained-draw chain storage and the Gibbs engine
/// with a Metropolis step for the noise precision.
pub mod sim;

/// Posterior marginal summaries (Normal approximations from the retained
/// draws) and posterior predictive sampling paired with the observed rows.
pub mod approx;

/// Model comparison: mean squared error against predictive samples and the
/// Deviance Information Criterion over the full chain.
pub mod compare;

/// Acceptance-rejection sampling of synthetic responses from the summarized
/// posterior, independent of the simulation engine.
pub mod reject;

/// Error taxonomy shared by all modules.
pub mod error;
