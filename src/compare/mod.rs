use nalgebra::*;
use serde::{Serialize, Deserialize};
use std::fmt::{self, Display};

use crate::error::Error;
use crate::sim::{Chain, gaussian_deviance};

/// Mean squared error between two paired sequences (typically the observed
/// responses and a posterior predictive sample of the same length). Order
/// of the pairs is irrelevant; unequal lengths are a caller bug.
pub fn mse(observed : &DVector<f64>, predicted : &DVector<f64>) -> Result<f64, Error> {
    if observed.nrows() != predicted.nrows() {
        return Err(Error::LengthMismatch(observed.nrows(), predicted.nrows()));
    }
    let n = observed.nrows() as f64;
    Ok((observed - predicted).norm_squared() / n)
}

/// Deviance Information Criterion computed from the full retained chain:
/// DIC = mean deviance + effective parameter count, with the effective count
/// pD = mean deviance - deviance at the posterior mean. Lower is preferred;
/// the criterion trades goodness of fit against model complexity, so a model
/// with more parameters can still win if the fit improvement outweighs the
/// penalty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dic {

    pub mean_deviance : f64,

    pub fit_deviance : f64,

    pub effective_params : f64,

    pub dic : f64

}

impl Display for Dic {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean deviance = {:.2}  penalty = {:.2}  DIC = {:.2}",
            self.mean_deviance, self.effective_params, self.dic
        )
    }

}

/// Computes the DIC of a fitted chain against the data it was fitted on.
/// The per-draw deviances were recorded by the engine over the whole
/// retained chain; only the plug-in deviance at the posterior mean is
/// evaluated here.
pub fn dic(chain : &Chain, y : &DVector<f64>, x : &DMatrix<f64>) -> Result<Dic, Error> {
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
    if y.nrows() != x.nrows() {
        return Err(Error::LengthMismatch(y.nrows(), x.nrows()));
    }
    let mean_deviance = chain.deviance().mean();
    let theta = chain.mean()?;
    let beta = theta.rows(0, p).clone_owned();
    let tau = theta[p];
    if tau <= 0.0 {
        return Err(Error::InvalidInitial(tau));
    }
    let sse = (y - x * beta).norm_squared();
    let fit_deviance = gaussian_deviance(sse, y.nrows(), tau);
    let effective_params = mean_deviance - fit_deviance;
    Ok(Dic {
        mean_deviance,
        fit_deviance,
        effective_params,
        dic : mean_deviance + effective_params
    })
}

/// Side-by-side scores of one fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelScore {

    pub name : String,

    pub mse : f64,

    pub dic : Dic

}

/// Comparison report for two fitted models over the same observations.
/// The decision rule prefers the model with the lower DIC, regardless of
/// parameter count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {

    pub first : ModelScore,

    pub second : ModelScore

}

impl Comparison {

    pub fn new(first : ModelScore, second : ModelScore) -> Self {
        Self { first, second }
    }

    /// Name of the preferred (lower DIC) model.
    pub fn preferred(&self) -> &str {
        if self.first.dic.dic <= self.second.dic.dic {
            &self.first.name
        } else {
            &self.second.name
        }
    }

}

impl Display for Comparison {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        for score in [&self.first, &self.second].iter() {
            writeln!(f, "{:<10} mse = {:>10.4}  {}", score.name, score.mse, score.dic)?;
        }
        write!(f, "preferred: {}", self.preferred())
    }

}
