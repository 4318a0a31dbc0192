use nalgebra::*;

use crate::error::Error;

/// Linear estimation by ordinary least squares, used here to seed the
/// coefficient priors with frequentist point estimates.
pub mod linear;

pub use linear::*;

/// Trait shared by point estimators. An estimator consumes a response
/// vector and a fixed design matrix and yields a fitted value carrying the
/// point estimates of interest. Settings hold whatever tuning the concrete
/// algorithm needs; estimators with nothing to tune take a unit-like
/// settings type with a Default implementation.
pub trait Estimator
where
    Self : Sized
{

    type Settings : Default;

    fn estimate(
        y : &DVector<f64>,
        x : &DMatrix<f64>,
        settings : Self::Settings
    ) -> Result<Self, Error>;

}
