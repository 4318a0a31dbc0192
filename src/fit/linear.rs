use nalgebra::*;

use crate::error::Error;
use crate::fit::Estimator;

/// Ordinary least squares. Solves the linear system X^T X b = X^T y via QR
/// decomposition of the cross-product matrix. The fit is used only to obtain
/// point estimates around which the Bayesian coefficient priors are centered,
/// so no standard errors or inferential quantities are derived beyond the
/// unnormalized coefficient covariance (X^T X)^-1 and the residual vector.
#[derive(Debug, Clone)]
pub struct Ols {

    pub beta : DVector<f64>,

    /// Inverse matrix of squares and cross-products, (X^T X)^-1.
    pub sigma_b : DMatrix<f64>,

    pub resid : Option<DVector<f64>>

}

impl Ols {

    /// Fitted values for a new design with the same column layout.
    pub fn predict(&self, x : &DMatrix<f64>) -> Result<DVector<f64>, Error> {
        if x.ncols() != self.beta.nrows() {
            return Err(Error::Dimension {
                context : "design columns vs. coefficients",
                expected : self.beta.nrows(),
                given : x.ncols()
            });
        }
        Ok(x * &self.beta)
    }

    /// Estimation from the cross-product matrices (X^T X) and (X^T y).
    /// Instantiates the fit without a residual vector.
    pub fn from_cross_products(xx : DMatrix<f64>, xy : &DVector<f64>) -> Result<Self, Error> {
        let qr = xx.clone().qr();
        let beta = qr.solve(xy).ok_or(Error::SingularSystem)?;
        let sigma_b = xx.try_inverse().ok_or(Error::SingularSystem)?;
        Ok(Self { beta, sigma_b, resid : None })
    }

    pub fn from_data(y : &DVector<f64>, x : &DMatrix<f64>) -> Result<Self, Error> {
        if y.nrows() != x.nrows() {
            return Err(Error::LengthMismatch(y.nrows(), x.nrows()));
        }
        let xx = x.transpose() * x;
        let xy = x.transpose() * y;
        let mut ols = Self::from_cross_products(xx, &xy)?;
        ols.resid = Some(y - ols.predict(x)?);
        Ok(ols)
    }

    /// Residual variance (maximum likelihood version, denominator n), used
    /// by the demo to center the noise precision prior.
    pub fn resid_var(&self) -> Option<f64> {
        self.resid.as_ref().map(|e| e.norm_squared() / e.nrows() as f64 )
    }

}

#[derive(Debug, Clone, Copy, Default)]
pub struct OlsSettings { }

impl Estimator for Ols {

    type Settings = OlsSettings;

    fn estimate(
        y : &DVector<f64>,
        x : &DMatrix<f64>,
        _settings : Self::Settings
    ) -> Result<Self, Error> {
        Self::from_data(y, x)
    }

}

#[cfg(test)]
mod tests {

    use super::*;

    const EPS : f64 = 1e-9;

    #[test]
    fn exact_fit_recovers_coefficients() {
        // y = 2 + 3x, no noise
        let x = DMatrix::from_columns(&[
            DVector::from_element(5, 1.0),
            DVector::from_column_slice(&[1.0, 2.0, 3.0, 4.0, 5.0])
        ]);
        let y = DVector::from_column_slice(&[5.0, 8.0, 11.0, 14.0, 17.0]);
        let ols = Ols::estimate(&y, &x, Default::default()).unwrap();
        assert!((ols.beta[0] - 2.0).abs() < EPS);
        assert!((ols.beta[1] - 3.0).abs() < EPS);
        assert!(ols.resid.as_ref().unwrap().norm() < EPS);
        assert!(ols.resid_var().unwrap() < EPS);
    }

    #[test]
    fn singular_design_is_rejected() {
        // second column is a multiple of the first
        let x = DMatrix::from_columns(&[
            DVector::from_element(4, 1.0),
            DVector::from_element(4, 2.0)
        ]);
        let y = DVector::from_element(4, 1.0);
        assert!(matches!(Ols::from_data(&y, &x), Err(Error::SingularSystem)));
    }

    #[test]
    fn dimension_checks() {
        let x = DMatrix::from_element(3, 2, 1.0);
        let y = DVector::from_element(4, 1.0);
        assert!(Ols::from_data(&y, &x).is_err());
    }

}
