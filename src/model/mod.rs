use nalgebra::*;
use serde::{Serialize, Deserialize};
use std::fmt::{self, Display};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::distr::NormalPrior;
use crate::error::Error;
use crate::sample::{Observation, Table};

/// Functional form relating the covariates of one observation to the mean
/// of its strength. `Linear` regresses strength on temperature and pressure
/// jointly; `Ratio` regresses it on the single derived predictor
/// pressure/temperature. Both include an intercept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Design {
    Linear,
    Ratio
}

impl Design {

    /// Number of regression coefficients (intercept included).
    pub fn dim(&self) -> usize {
        match self {
            Design::Linear => 3,
            Design::Ratio => 2
        }
    }

    fn row(&self, obs : &Observation) -> Vec<f64> {
        match self {
            Design::Linear => vec![1.0, obs.temperature, obs.pressure],
            Design::Ratio => vec![1.0, obs.pressure / obs.temperature]
        }
    }

    /// Builds the design matrix for a table, one observation per row.
    /// A non-finite predictor (e.g. a ratio over a zero temperature) is a
    /// data problem surfaced here rather than propagated as NaN.
    pub fn matrix(&self, table : &Table) -> Result<DMatrix<f64>, Error> {
        let p = self.dim();
        let mut m = DMatrix::zeros(table.len(), p);
        for (i, obs) in table.iter().enumerate() {
            let row = self.row(obs);
            for j in 0..p {
                if !row[j].is_finite() {
                    return Err(Error::DegenerateDesign(i));
                }
                m[(i, j)] = row[j];
            }
        }
        Ok(m)
    }

}

/// Structured description of one Bayesian regression model: a named Normal
/// prior per regression coefficient, a Normal prior over the noise precision,
/// and the likelihood relation (the design). This replaces the declarative
/// model text the sampling engine of the source analysis consumed; being
/// plain data, a model can be saved to and loaded back from JSON.
///
/// For every observation i the response is conditionally
/// y_i ~ Normal(x_i' b, 1/tau), with b the coefficient vector and tau the
/// shared noise precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionModel {

    name : String,

    design : Design,

    coefs : Vec<NormalPrior>,

    noise : NormalPrior

}

impl RegressionModel {

    pub fn new(
        name : &str,
        design : Design,
        coefs : Vec<NormalPrior>,
        noise : NormalPrior
    ) -> Result<Self, Error> {
        if coefs.len() != design.dim() {
            return Err(Error::PriorCount {
                model : name.to_string(),
                expected : design.dim(),
                given : coefs.len()
            });
        }
        let model = Self { name : name.to_string(), design, coefs, noise };
        model.validate()?;
        Ok(model)
    }

    /// Convenience constructor for the usual seeding pattern: coefficient
    /// priors centered at a frequentist point estimate, all sharing one
    /// hand-chosen precision.
    pub fn centered_at(
        name : &str,
        design : Design,
        beta : &DVector<f64>,
        coef_precision : f64,
        noise : NormalPrior
    ) -> Result<Self, Error> {
        if beta.nrows() != design.dim() {
            return Err(Error::PriorCount {
                model : name.to_string(),
                expected : design.dim(),
                given : beta.nrows()
            });
        }
        let coefs = beta.iter().enumerate()
            .map(|(i, b)| NormalPrior::new(&format!("b{}", i), *b, coef_precision) )
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, design, coefs, noise)
    }

    fn validate(&self) -> Result<(), Error> {
        for prior in self.coefs.iter().chain(std::iter::once(&self.noise)) {
            prior.validate()?;
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn design(&self) -> Design {
        self.design
    }

    pub fn coef_priors(&self) -> &[NormalPrior] {
        &self.coefs
    }

    pub fn noise_prior(&self) -> &NormalPrior {
        &self.noise
    }

    /// Names of all parameters in chain order: coefficients first, noise
    /// precision last.
    pub fn parameter_names(&self) -> Vec<String> {
        self.coefs.iter()
            .map(|p| p.name().to_string() )
            .chain(std::iter::once(self.noise.name().to_string()))
            .collect()
    }

    pub fn coef_prior_means(&self) -> DVector<f64> {
        DVector::from_iterator(self.coefs.len(), self.coefs.iter().map(|p| p.mean() ))
    }

    pub fn coef_prior_precisions(&self) -> DVector<f64> {
        DVector::from_iterator(self.coefs.len(), self.coefs.iter().map(|p| p.precision() ))
    }

    pub fn load_from_path<P>(path : P) -> Result<Self, Error>
    where
        P : AsRef<Path>
    {
        let f = File::open(path)?;
        Self::load(f)
    }

    pub fn load<R>(mut reader : R) -> Result<Self, Error>
    where
        R : Read
    {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let model : Self = serde_json::from_str(&content)?;
        if model.coefs.len() != model.design.dim() {
            return Err(Error::PriorCount {
                model : model.name.clone(),
                expected : model.design.dim(),
                given : model.coefs.len()
            });
        }
        model.validate()?;
        Ok(model)
    }

    pub fn save_to_path<P>(&self, path : P) -> Result<(), Error>
    where
        P : AsRef<Path>
    {
        let f = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
        self.save(f)
    }

    pub fn save<W>(&self, mut writer : W) -> Result<(), Error>
    where
        W : Write
    {
        let content = serde_json::to_string_pretty(self)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

}

impl Display for RegressionModel {

    fn fmt(&self, f : &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = match self.design {
            Design::Linear => "strength ~ temperature + pressure",
            Design::Ratio => "strength ~ pressure/temperature"
        };
        writeln!(f, "{}: {}", self.name, relation)?;
        for p in &self.coefs {
            writeln!(f, "  {} ~ Normal(mean {:.4}, precision {:.4})", p.name(), p.mean(), p.precision())?;
        }
        writeln!(f, "  {} ~ Normal(mean {:.4}, precision {:.4})", self.noise.name(), self.noise.mean(), self.noise.precision())
    }

}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::sample::Table;

    fn priors(n : usize) -> Vec<NormalPrior> {
        (0..n).map(|i| NormalPrior::new(&format!("b{}", i), 0.0, 1e-2).unwrap() ).collect()
    }

    fn noise() -> NormalPrior {
        NormalPrior::new("tau", 1.0, 1e-2).unwrap()
    }

    #[test]
    fn prior_count_must_match_design() {
        assert!(RegressionModel::new("m", Design::Linear, priors(3), noise()).is_ok());
        assert!(matches!(
            RegressionModel::new("m", Design::Linear, priors(2), noise()),
            Err(Error::PriorCount { .. })
        ));
    }

    #[test]
    fn design_matrix_layout() {
        let txt = "temperature pressure strength\n80.0 4.0 35.5\n90.0 6.0 33.1\n";
        let tbl = Table::from_reader(txt.as_bytes()).unwrap();
        let xa = Design::Linear.matrix(&tbl).unwrap();
        assert_eq!(xa.shape(), (2, 3));
        assert_eq!(xa[(1, 0)], 1.0);
        assert_eq!(xa[(1, 1)], 90.0);
        let xb = Design::Ratio.matrix(&tbl).unwrap();
        assert_eq!(xb.shape(), (2, 2));
        assert!((xb[(0, 1)] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn zero_temperature_degenerates_ratio_design() {
        let txt = "temperature pressure strength\n0.0 4.0 35.5\n";
        let tbl = Table::from_reader(txt.as_bytes()).unwrap();
        assert!(matches!(Design::Ratio.matrix(&tbl), Err(Error::DegenerateDesign(0))));
        assert!(Design::Linear.matrix(&tbl).is_ok());
    }

    #[test]
    fn json_round_trip() {
        let model = RegressionModel::new("ratio", Design::Ratio, priors(2), noise()).unwrap();
        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();
        let back = RegressionModel::load(&buf[..]).unwrap();
        assert_eq!(back.name(), "ratio");
        assert_eq!(back.design(), Design::Ratio);
        assert_eq!(back.coef_priors(), model.coef_priors());
    }

    #[test]
    fn load_rejects_nonpositive_precision() {
        let bad = r#"{
            "name" : "m",
            "design" : "Ratio",
            "coefs" : [
                { "name" : "b0", "mean" : 0.0, "precision" : 1.0 },
                { "name" : "b1", "mean" : 0.0, "precision" : -2.0 }
            ],
            "noise" : { "name" : "tau", "mean" : 1.0, "precision" : 1.0 }
        }"#;
        assert!(matches!(
            RegressionModel::load(bad.as_bytes()),
            Err(Error::InvalidPrecision { .. })
        ));
    }

}
