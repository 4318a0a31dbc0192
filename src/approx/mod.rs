use nalgebra::*;
use num_traits::AsPrimitive;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};
use std::fmt::{self, Display};

use crate::distr::Normal;
use crate::error::Error;
use crate::sim::Chain;

/// Normal approximation of one marginal posterior, summarized from the
/// retained draws of a chain. This is a diagnostic summary of an empirical
/// distribution, not an exact posterior: the mean/sd pair is simply the
/// sample mean and sample standard deviation of the marginal trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorMarginal {

    pub name : String,

    pub mean : f64,

    pub sd : f64

}

impl PosteriorMarginal {

    pub fn to_normal(&self) -> Result<Normal, Error> {
        Normal::new(self.mean, self.sd)
    }

}

impl Display for PosteriorMarginal {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8} mean = {:>10.4}  sd = {:>10.4}", self.name, self.mean, self.sd)
    }

}

/// Sample mean and standard deviation (n-1 denominator) of any sequence of
/// values convertible to f64.
pub fn mean_sd<T>(vals : &[T]) -> (f64, f64)
where
    T : AsPrimitive<f64>
{
    let n = vals.len() as f64;
    if vals.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mean = vals.iter().fold(0.0, |acc, v| acc + v.as_() ) / n;
    if vals.len() < 2 {
        return (mean, 0.0);
    }
    let ss = vals.iter().fold(0.0, |acc, v| acc + (v.as_() - mean).powi(2) );
    (mean, (ss / (n - 1.0)).sqrt())
}

/// Summarizes every marginal of the chain into a (mean, sd) record, in the
/// engine's parameter order (coefficients first, noise precision last).
pub fn summarize(chain : &Chain) -> Result<Vec<PosteriorMarginal>, Error> {
    if chain.is_empty() {
        return Err(Error::EmptyChain);
    }
    let mut marginals = Vec::with_capacity(chain.dim());
    for (i, name) in chain.names().iter().enumerate() {
        let traj = chain.parameter(i);
        let (mean, sd) = mean_sd(traj.as_slice());
        marginals.push(PosteriorMarginal { name : name.clone(), mean, sd });
    }
    Ok(marginals)
}

/// Posterior predictive sampling: for each covariate row, one parameter
/// vector is drawn uniformly from the retained posterior draws and one
/// synthetic response is drawn from the gaussian likelihood at that
/// parameter. The output pairs one-to-one with the rows of the design, so a
/// predictive sample is always directly comparable to the observed
/// responses.
pub fn posterior_predictive(
    chain : &Chain,
    x : &DMatrix<f64>,
    seed : u64
) -> Result<DVector<f64>, Error> {
    if chain.is_empty() {
        return Err(Error::EmptyChain);
    }
    let p = x.ncols();
    if chain.dim() != p + 1 {
        return Err(Error::Dimension {
            context : "chain parameters vs. design columns + precision",
            expected : p + 1,
            given : chain.dim()
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = DVector::zeros(x.nrows());
    for i in 0..x.nrows() {
        let j = rng.gen_range(0, chain.len());
        let draw = chain.draw(j);
        let mut mu = 0.0;
        for k in 0..p {
            mu += x[(i, k)] * draw[k];
        }
        let tau = draw[p];
        if tau <= 0.0 || !mu.is_finite() {
            return Err(Error::DegenerateDesign(i));
        }
        out[i] = Normal::new(mu, tau.powf(-0.5))?.sample(&mut rng);
    }
    Ok(out)
}
