use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;
use std::f64::consts::PI;

use crate::distr::Normal;
use crate::error::Error;
use crate::model::RegressionModel;
use crate::sim::{Chain, SamplerSettings};

// Burn-in proposal adaptation window (iterations per scale adjustment).
const ADAPT_WINDOW : usize = 50;

/// Posterior sampling engine for the regression models. The coefficient
/// block has a conjugate multivariate-Normal full conditional given the
/// noise precision, and is drawn exactly via a Cholesky factorization of the
/// conditional precision matrix. The noise precision carries a Normal prior
/// (following the model declaration), which is not conjugate for a gaussian
/// likelihood, so it moves by a random-walk Metropolis step: a proposal
/// increment is drawn from a zero-centered gaussian and accepted with
/// probability min(1, exp(lp_new - lp_old)) against a uniform draw; proposals
/// at non-positive precision have conditional density zero and are always
/// rejected.
///
/// Each chain starts at the prior means, runs `burn_in` discarded
/// adaptation iterations during which the proposal scale is tuned toward a
/// moderate acceptance rate, then records `iterations` production draws
/// together with the model deviance at each draw. Chains run sequentially
/// under per-chain seeds derived from the base seed, and their retained
/// draws are concatenated.
#[derive(Debug, Clone)]
pub struct Gibbs {

    settings : SamplerSettings

}

impl Gibbs {

    pub fn new(settings : SamplerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }

    pub fn run(
        &self,
        model : &RegressionModel,
        y : &DVector<f64>,
        x : &DMatrix<f64>
    ) -> Result<Chain, Error> {
        let s = &self.settings;
        if x.ncols() != model.design().dim() {
            return Err(Error::Dimension {
                context : "design columns vs. model coefficients",
                expected : model.design().dim(),
                given : x.ncols()
            });
        }
        if y.nrows() != x.nrows() {
            return Err(Error::LengthMismatch(y.nrows(), x.nrows()));
        }
        if model.noise_prior().mean() <= 0.0 {
            return Err(Error::InvalidInitial(model.noise_prior().mean()));
        }
        let total = s.chains.max(1) * (s.burn_in + s.iterations);
        let pb = if s.progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len}")
                .progress_chars("=> "));
            pb.set_message(model.name().to_string());
            pb
        } else {
            ProgressBar::hidden()
        };
        let mut chain : Option<Chain> = None;
        for c in 0..s.chains.max(1) {
            let seed = s.seed.wrapping_add(c as u64);
            let next = self.run_chain(model, y, x, seed, &pb)?;
            match chain {
                Some(ref mut acc) => acc.append(next)?,
                None => chain = Some(next)
            }
        }
        pb.finish_and_clear();
        chain.ok_or(Error::EmptyChain)
    }

    fn run_chain(
        &self,
        model : &RegressionModel,
        y : &DVector<f64>,
        x : &DMatrix<f64>,
        seed : u64,
        pb : &ProgressBar
    ) -> Result<Chain, Error> {
        let s = &self.settings;
        let n = y.nrows();
        let p = x.ncols();
        let xtx = x.transpose() * x;
        let xty = x.transpose() * y;
        let prior_mean = model.coef_prior_means();
        let prior_prec = model.coef_prior_precisions();
        let noise_prior = model.noise_prior().to_normal()?;
        let mut rng = StdRng::seed_from_u64(seed);

        // Initial state: all parameters at their prior means.
        let mut beta = prior_mean.clone();
        let mut tau = model.noise_prior().mean();
        let mut step = s.step;

        let mut draws = DMatrix::zeros(p + 1, s.iterations);
        let mut deviance = DVector::zeros(s.iterations);
        let mut accepted = 0;
        let mut window_accepted = 0;
        for t in 0..s.burn_in + s.iterations {
            beta = draw_coefficients(&mut rng, &xtx, &xty, tau, &prior_mean, &prior_prec)?;
            let sse = (y - x * &beta).norm_squared();
            let (next_tau, acc) = step_precision(&mut rng, tau, step, sse, n, &noise_prior);
            tau = next_tau;
            if t < s.burn_in {
                if acc {
                    window_accepted += 1;
                }
                if (t + 1) % ADAPT_WINDOW == 0 {
                    let rate = window_accepted as f64 / ADAPT_WINDOW as f64;
                    if rate > 0.5 {
                        step *= 1.1;
                    } else if rate < 0.3 {
                        step *= 0.9;
                    }
                    window_accepted = 0;
                }
            } else {
                let j = t - s.burn_in;
                for i in 0..p {
                    draws[(i, j)] = beta[i];
                }
                draws[(p, j)] = tau;
                deviance[j] = gaussian_deviance(sse, n, tau);
                if acc {
                    accepted += 1;
                }
            }
            pb.inc(1);
        }
        let accept_rate = accepted as f64 / s.iterations.max(1) as f64;
        Chain::new(model.parameter_names(), draws, deviance, accept_rate)
    }

}

/// Deviance -2 log p(y | beta, tau) of n gaussian observations with total
/// squared error sse and noise precision tau.
pub fn gaussian_deviance(sse : f64, n : usize, tau : f64) -> f64 {
    let n = n as f64;
    n * (2.0 * PI).ln() - n * tau.ln() + tau * sse
}

// Exact draw from the coefficient full conditional
// N((P0 + tau X'X)^-1 (P0 m0 + tau X'y), (P0 + tau X'X)^-1),
// sampled as mean + L^-T z for the Cholesky factor L of the conditional
// precision.
fn draw_coefficients<R>(
    rng : &mut R,
    xtx : &DMatrix<f64>,
    xty : &DVector<f64>,
    tau : f64,
    prior_mean : &DVector<f64>,
    prior_prec : &DVector<f64>
) -> Result<DVector<f64>, Error>
where
    R : Rng
{
    let p = prior_mean.nrows();
    let mut prec = xtx * tau;
    for i in 0..p {
        prec[(i, i)] += prior_prec[i];
    }
    let b = xty * tau + prior_prec.component_mul(prior_mean);
    let chol = Cholesky::new(prec).ok_or(Error::SingularSystem)?;
    let mean = chol.solve(&b);
    let z = DVector::from_fn(p, |_, _| rng.sample::<f64, _>(StandardNormal) );
    let noise = chol.l().transpose()
        .solve_upper_triangular(&z)
        .ok_or(Error::SingularSystem)?;
    Ok(mean + noise)
}

fn log_conditional_precision(tau : f64, sse : f64, n : usize, prior : &Normal) -> f64 {
    if tau <= 0.0 {
        return f64::NEG_INFINITY;
    }
    0.5 * n as f64 * tau.ln() - 0.5 * tau * sse + prior.log_prob(tau)
}

fn step_precision<R>(
    rng : &mut R,
    tau : f64,
    step : f64,
    sse : f64,
    n : usize,
    prior : &Normal
) -> (f64, bool)
where
    R : Rng
{
    let z : f64 = rng.sample(StandardNormal);
    let proposal = tau + step * z;
    let diff = log_conditional_precision(proposal, sse, n, prior)
        - log_conditional_precision(tau, sse, n, prior);
    let u : f64 = rng.gen();
    if u.ln() < diff {
        (proposal, true)
    } else {
        (tau, false)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::distr::NormalPrior;
    use crate::model::Design;
    use crate::sample::Table;

    fn toy_table() -> Table {
        // strength = 30 + 0.2 temperature - 1.0 pressure, small noise
        let txt = "temperature pressure strength\n\
            60.0 3.0 39.1\n70.0 4.0 40.2\n80.0 5.0 40.9\n90.0 6.0 42.1\n\
            65.0 8.0 35.0\n75.0 9.0 35.9\n85.0 10.0 37.2\n95.0 11.0 38.0\n\
            62.0 5.0 37.5\n72.0 6.0 38.3\n82.0 7.0 39.5\n92.0 8.0 40.4\n";
        Table::from_reader(txt.as_bytes()).unwrap()
    }

    fn toy_model() -> RegressionModel {
        let coefs = vec![
            NormalPrior::new("b0", 30.0, 1e-2).unwrap(),
            NormalPrior::new("b1", 0.2, 1e-2).unwrap(),
            NormalPrior::new("b2", -1.0, 1e-2).unwrap()
        ];
        let noise = NormalPrior::new("tau", 10.0, 1e-2).unwrap();
        RegressionModel::new("toy", Design::Linear, coefs, noise).unwrap()
    }

    #[test]
    fn retained_draws_exclude_burn_in() {
        let tbl = toy_table();
        let model = toy_model();
        let y = tbl.strength();
        let x = Design::Linear.matrix(&tbl).unwrap();
        let settings = SamplerSettings { burn_in : 200, iterations : 500, ..Default::default() };
        let chain = Gibbs::new(settings).run(&model, &y, &x).unwrap();
        assert_eq!(chain.len(), 500);
        assert_eq!(chain.dim(), 4);
        assert_eq!(chain.deviance().nrows(), 500);
    }

    #[test]
    fn chains_concatenate_retained_draws() {
        let tbl = toy_table();
        let model = toy_model();
        let y = tbl.strength();
        let x = Design::Linear.matrix(&tbl).unwrap();
        let settings = SamplerSettings {
            burn_in : 100,
            iterations : 300,
            chains : 3,
            ..Default::default()
        };
        let chain = Gibbs::new(settings).run(&model, &y, &x).unwrap();
        assert_eq!(chain.len(), 3 * 300);
    }

    #[test]
    fn sampler_is_reproducible_under_seed() {
        let tbl = toy_table();
        let model = toy_model();
        let y = tbl.strength();
        let x = Design::Linear.matrix(&tbl).unwrap();
        let settings = SamplerSettings { burn_in : 100, iterations : 200, seed : 7, ..Default::default() };
        let a = Gibbs::new(settings).run(&model, &y, &x).unwrap();
        let b = Gibbs::new(settings).run(&model, &y, &x).unwrap();
        assert_eq!(a.parameter(0), b.parameter(0));
        assert_eq!(a.deviance(), b.deviance());
    }

    #[test]
    fn precision_stays_positive() {
        let tbl = toy_table();
        let model = toy_model();
        let y = tbl.strength();
        let x = Design::Linear.matrix(&tbl).unwrap();
        let settings = SamplerSettings { burn_in : 200, iterations : 500, ..Default::default() };
        let chain = Gibbs::new(settings).run(&model, &y, &x).unwrap();
        let tau = chain.parameter_by_name("tau").unwrap();
        assert!(tau.iter().all(|t| *t > 0.0 ));
    }

    #[test]
    fn nonpositive_initial_precision_is_rejected() {
        let tbl = toy_table();
        let y = tbl.strength();
        let x = Design::Linear.matrix(&tbl).unwrap();
        let coefs = vec![
            NormalPrior::new("b0", 0.0, 1e-2).unwrap(),
            NormalPrior::new("b1", 0.0, 1e-2).unwrap(),
            NormalPrior::new("b2", 0.0, 1e-2).unwrap()
        ];
        let noise = NormalPrior::new("tau", -5.0, 1e-2).unwrap();
        let model = RegressionModel::new("bad", Design::Linear, coefs, noise).unwrap();
        let res = Gibbs::new(Default::default()).run(&model, &y, &x);
        assert!(matches!(res, Err(Error::InvalidInitial(_))));
    }

}
