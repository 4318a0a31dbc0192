use nalgebra::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::approx::PosteriorMarginal;
use crate::error::Error;
use crate::model::RegressionModel;

/// Tuning for one acceptance-rejection run: number of candidate trials, the
/// constant envelope factor k scaling the proposal density, and the RNG
/// seed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RejectionSettings {

    pub trials : usize,

    pub envelope : f64,

    pub seed : u64

}

impl Default for RejectionSettings {

    fn default() -> Self {
        Self { trials : 10_000, envelope : 30.0, seed : 0 }
    }

}

/// Outcome of an acceptance-rejection run. The accepted sample has variable
/// length: it never exceeds the number of trials and is not guaranteed to
/// reach any requested size. Trials whose density ratio was non-finite are
/// counted as skipped rather than failing the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionSample {

    pub accepted : Vec<f64>,

    pub trials : usize,

    pub skipped : usize

}

impl RejectionSample {

    pub fn acceptance_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.accepted.len() as f64 / self.trials as f64
    }

}

/// Acceptance-rejection sampling of synthetic responses, an alternative to
/// the simulation engine that works directly from the summarized posterior
/// marginals. Each trial:
///
/// 1. samples one covariate row uniformly from the design;
/// 2. samples one value per parameter from its marginal posterior summary,
///    independently (posterior correlation between parameters is ignored --
///    a known approximation of this illustration);
/// 3. synthesizes a candidate response from the gaussian likelihood at the
///    sampled parameters;
/// 4. evaluates the candidate's density f under the posterior-parameterized
///    model and g under the prior-parameterized model;
/// 5. accepts the candidate when a uniform draw falls below the standard
///    acceptance ratio f / (k g).
///
/// A trial whose parameters yield a degenerate (non-finite or non-positive
/// precision) density is skipped, not raised. The marginals must follow the
/// engine's parameter order, coefficients first and noise precision last.
pub fn rejection_sample(
    model : &RegressionModel,
    marginals : &[PosteriorMarginal],
    x : &DMatrix<f64>,
    settings : &RejectionSettings
) -> Result<RejectionSample, Error> {
    let p = x.ncols();
    if marginals.len() != p + 1 {
        return Err(Error::Dimension {
            context : "posterior marginals vs. design columns + precision",
            expected : p + 1,
            given : marginals.len()
        });
    }
    if model.design().dim() != p {
        return Err(Error::Dimension {
            context : "design columns vs. model coefficients",
            expected : model.design().dim(),
            given : p
        });
    }
    let coef_marginals = marginals[..p].iter()
        .map(|m| m.to_normal() )
        .collect::<Result<Vec<_>, _>>()?;
    let prec_marginal = marginals[p].to_normal()?;

    // Prior-parameterized model, the proposal side of the density ratio.
    let prior_beta = model.coef_prior_means();
    let prior_tau = model.noise_prior().mean();
    if prior_tau <= 0.0 {
        return Err(Error::InvalidInitial(prior_tau));
    }
    let prior_sd = prior_tau.powf(-0.5);

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut accepted = Vec::new();
    let mut skipped = 0;
    for _ in 0..settings.trials {
        let i = rng.gen_range(0, x.nrows());
        let mut mu = 0.0;
        for k in 0..p {
            mu += x[(i, k)] * coef_marginals[k].sample(&mut rng);
        }
        let tau = prec_marginal.sample(&mut rng);
        if tau <= 0.0 || !mu.is_finite() {
            skipped += 1;
            continue;
        }
        let post = match crate::distr::Normal::new(mu, tau.powf(-0.5)) {
            Ok(post) => post,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let candidate = post.sample(&mut rng);
        let mut prior_mu = 0.0;
        for k in 0..p {
            prior_mu += x[(i, k)] * prior_beta[k];
        }
        let f = post.prob(candidate);
        let g = match crate::distr::Normal::new(prior_mu, prior_sd) {
            Ok(prior) => prior.prob(candidate),
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let ratio = f / (settings.envelope * g);
        if !ratio.is_finite() {
            skipped += 1;
            continue;
        }
        let u : f64 = rng.gen();
        if u < ratio {
            accepted.push(candidate);
        }
    }
    Ok(RejectionSample { accepted, trials : settings.trials, skipped })
}
