use nalgebra::*;
use serde::{Serialize, Deserialize};

use crate::error::Error;

/// Gibbs sampler for the regression models, with a Metropolis step for the
/// noise precision.
pub mod gibbs;

pub use gibbs::*;

/// An ordered sequence of retained posterior parameter draws, stored as a
/// trajectory matrix with one parameter per row and one draw per column,
/// plus the model deviance evaluated at each draw. Only post-burn-in draws
/// ever enter a Chain: the sampler discards its burn-in/adaptation phase
/// before recording, so every downstream statistic (marginal summaries,
/// predictive sampling, DIC) sees production draws exclusively.
///
/// Parameter order is fixed by the engine: regression coefficients first,
/// noise precision as the last row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {

    names : Vec<String>,

    draws : DMatrix<f64>,

    deviance : DVector<f64>,

    accept_rate : f64

}

impl Chain {

    pub fn new(
        names : Vec<String>,
        draws : DMatrix<f64>,
        deviance : DVector<f64>,
        accept_rate : f64
    ) -> Result<Self, Error> {
        if names.len() != draws.nrows() {
            return Err(Error::Dimension {
                context : "parameter names vs. trajectory rows",
                expected : draws.nrows(),
                given : names.len()
            });
        }
        if deviance.nrows() != draws.ncols() {
            return Err(Error::Dimension {
                context : "deviance entries vs. retained draws",
                expected : draws.ncols(),
                given : deviance.nrows()
            });
        }
        Ok(Self { names, draws, deviance, accept_rate })
    }

    /// Number of retained draws.
    pub fn len(&self) -> usize {
        self.draws.ncols()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.ncols() == 0
    }

    /// Number of parameters per draw.
    pub fn dim(&self) -> usize {
        self.draws.nrows()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// One full parameter vector (a column of the trajectory).
    pub fn draw(&self, j : usize) -> DVectorSlice<'_, f64> {
        self.draws.column(j)
    }

    /// The marginal trajectory of one parameter across all retained draws.
    pub fn parameter(&self, i : usize) -> DVector<f64> {
        self.draws.row(i).transpose()
    }

    pub fn parameter_by_name(&self, name : &str) -> Option<DVector<f64>> {
        self.names.iter().position(|n| n == name ).map(|i| self.parameter(i) )
    }

    /// Deviance of the model at each retained draw, recorded by the engine
    /// while sampling.
    pub fn deviance(&self) -> &DVector<f64> {
        &self.deviance
    }

    /// Posterior mean parameter vector, averaged over all retained draws.
    pub fn mean(&self) -> Result<DVector<f64>, Error> {
        if self.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(self.draws.column_mean())
    }

    /// Metropolis acceptance rate of the noise precision step over the
    /// retained phase (diagnostic only).
    pub fn accept_rate(&self) -> f64 {
        self.accept_rate
    }

    /// Concatenates the retained draws of another chain over the same
    /// parameters (sequentially run chains of one model).
    pub fn append(&mut self, other : Chain) -> Result<(), Error> {
        if other.names != self.names {
            return Err(Error::Dimension {
                context : "parameters of appended chain",
                expected : self.names.len(),
                given : other.names.len()
            });
        }
        let n_self = self.len();
        let n_other = other.len();
        let mut draws = DMatrix::zeros(self.dim(), n_self + n_other);
        draws.columns_mut(0, n_self).copy_from(&self.draws);
        draws.columns_mut(n_self, n_other).copy_from(&other.draws);
        let mut deviance = DVector::zeros(n_self + n_other);
        deviance.rows_mut(0, n_self).copy_from(&self.deviance);
        deviance.rows_mut(n_self, n_other).copy_from(&other.deviance);
        let total = (n_self + n_other) as f64;
        self.accept_rate = (self.accept_rate * n_self as f64
            + other.accept_rate * n_other as f64) / total;
        self.draws = draws;
        self.deviance = deviance;
        Ok(())
    }

}

/// Tuning for one sampler invocation. Iteration counts follow the engine
/// convention of the source analysis: `burn_in` adaptation steps are run and
/// discarded, then `iterations` production draws are retained, per chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplerSettings {

    pub burn_in : usize,

    pub iterations : usize,

    pub chains : usize,

    pub seed : u64,

    /// Initial proposal scale of the Metropolis step for the noise
    /// precision; adapted during burn-in, frozen afterwards.
    pub step : f64,

    pub progress : bool

}

impl Default for SamplerSettings {

    fn default() -> Self {
        Self {
            burn_in : 500,
            iterations : 2000,
            chains : 1,
            seed : 0,
            step : 0.25,
            progress : false
        }
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    fn chain(vals : &[f64], dev : &[f64]) -> Chain {
        let draws = DMatrix::from_row_slice(1, vals.len(), vals);
        Chain::new(
            vec![String::from("b0")],
            draws,
            DVector::from_column_slice(dev),
            0.5
        ).unwrap()
    }

    #[test]
    fn mean_and_marginals() {
        let c = chain(&[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0]);
        assert_eq!(c.len(), 3);
        assert_eq!(c.dim(), 1);
        assert_eq!(c.mean().unwrap()[0], 2.0);
        assert_eq!(c.parameter_by_name("b0").unwrap()[2], 3.0);
        assert!(c.parameter_by_name("tau").is_none());
    }

    #[test]
    fn append_concatenates() {
        let mut a = chain(&[1.0, 2.0], &[5.0, 6.0]);
        let b = chain(&[3.0, 4.0], &[7.0, 8.0]);
        a.append(b).unwrap();
        assert_eq!(a.len(), 4);
        assert_eq!(a.parameter(0)[3], 4.0);
        assert_eq!(a.deviance()[2], 7.0);
    }

    #[test]
    fn dimension_checks() {
        let draws = DMatrix::zeros(2, 3);
        let dev = DVector::zeros(2);
        assert!(Chain::new(vec![String::from("a"), String::from("b")], draws, dev, 0.0).is_err());
    }

}
