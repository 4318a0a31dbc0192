use rand::Rng;
use rand_distr::Distribution as _;
use serde::{Serialize, Deserialize};
use statrs::distribution::Continuous;

use crate::error::Error;

/// Univariate gaussian, the only analytical distribution this crate needs:
/// it serves as prior for every model parameter, as the likelihood of each
/// observation conditional on the linear predictor, and as the summarized
/// (mean/sd) representation of a posterior marginal. Density evaluation is
/// delegated to statrs and sampling to rand_distr; both objects are built
/// once at construction, after the parameters are validated.
#[derive(Debug, Clone, Copy)]
pub struct Normal {

    mean : f64,

    sd : f64,

    dens : statrs::distribution::Normal,

    sampler : rand_distr::Normal<f64>

}

impl Normal {

    pub fn new(mean : f64, sd : f64) -> Result<Self, Error> {
        if !mean.is_finite() || !sd.is_finite() || sd <= 0.0 {
            return Err(Error::InvalidNormal { mean, sd });
        }
        let dens = statrs::distribution::Normal::new(mean, sd)
            .map_err(|_| Error::InvalidNormal { mean, sd })?;
        let sampler = rand_distr::Normal::new(mean, sd)
            .map_err(|_| Error::InvalidNormal { mean, sd })?;
        Ok(Self { mean, sd, dens, sampler })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sd(&self) -> f64 {
        self.sd
    }

    pub fn var(&self) -> f64 {
        self.sd * self.sd
    }

    pub fn prob(&self, y : f64) -> f64 {
        self.dens.pdf(y)
    }

    pub fn log_prob(&self, y : f64) -> f64 {
        self.dens.ln_pdf(y)
    }

    pub fn sample<R>(&self, rng : &mut R) -> f64
    where
        R : Rng
    {
        self.sampler.sample(rng)
    }

}

/// A named Normal prior declared over one scalar model parameter, carrying
/// the (mean, precision) pair the source analysis hands to the sampling
/// engine. Precision must be strictly positive; a non-positive or non-finite
/// precision is a configuration bug and is rejected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalPrior {

    name : String,

    mean : f64,

    precision : f64

}

impl NormalPrior {

    pub fn new(name : &str, mean : f64, precision : f64) -> Result<Self, Error> {
        let prior = Self { name : name.to_string(), mean, precision };
        prior.validate()?;
        Ok(prior)
    }

    /// Re-checks the parameter constraints. Needed after deserializing a
    /// model configuration, which bypasses `new`.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.mean.is_finite() || !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(Error::InvalidPrecision {
                name : self.name.clone(),
                precision : self.precision
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    pub fn sd(&self) -> f64 {
        self.precision.powf(-0.5)
    }

    pub fn to_normal(&self) -> Result<Normal, Error> {
        Normal::new(self.mean, self.sd())
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::PI;

    const EPS : f64 = 1e-10;

    #[test]
    fn log_prob_closed_form() {
        let n = Normal::new(1.5, 2.0).unwrap();
        let y = 0.7;
        let lp = -0.5 * ((y - 1.5f64) / 2.0).powi(2) - (2.0f64 * (2.0 * PI).sqrt()).ln();
        assert!((n.log_prob(y) - lp).abs() < EPS);
        assert!((n.prob(y) - lp.exp()).abs() < EPS);
    }

    #[test]
    fn invalid_parameters() {
        assert!(Normal::new(0.0, 0.0).is_err());
        assert!(Normal::new(f64::NAN, 1.0).is_err());
        assert!(Normal::new(0.0, -1.0).is_err());
    }

    #[test]
    fn prior_precision_must_be_positive() {
        assert!(matches!(
            NormalPrior::new("beta0", 0.0, -1.0),
            Err(Error::InvalidPrecision { .. })
        ));
        assert!(NormalPrior::new("beta0", 0.0, 1e-3).is_ok());
    }

    #[test]
    fn prior_sd_matches_precision() {
        let p = NormalPrior::new("tau", 2.0, 4.0).unwrap();
        assert!((p.sd() - 0.5).abs() < EPS);
        let n = p.to_normal().unwrap();
        assert!((n.mean() - 2.0).abs() < EPS);
        assert!((n.sd() - 0.5).abs() < EPS);
    }

    #[test]
    fn sampling_is_seeded() {
        let n = Normal::new(0.0, 1.0).unwrap();
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        assert_eq!(n.sample(&mut a), n.sample(&mut b));
    }

}
