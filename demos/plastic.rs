use anyhow::Result;
use polyreg::approx::{posterior_predictive, summarize};
use polyreg::compare::{dic, mse, Comparison, ModelScore};
use polyreg::distr::NormalPrior;
use polyreg::fit::{Estimator, Ols};
use polyreg::model::{Design, RegressionModel};
use polyreg::reject::{rejection_sample, RejectionSettings};
use polyreg::sample::Table;
use polyreg::sim::{Gibbs, SamplerSettings};

// Analysis constants, fixed for reproducibility.
const SUBSAMPLE : usize = 100;
const SEED : u64 = 42;
const BURN_IN : usize = 1000;
const ITERATIONS : usize = 10_000;
const CHAINS : usize = 3;
const COEF_PRECISION : f64 = 1e-2;
const NOISE_PRECISION : f64 = 1e-2;
const REJECTION_TRIALS : usize = 10_000;
const ENVELOPE : f64 = 30.0;

fn main() -> Result<()> {
    let population = Table::open("data/plastic.txt")?;
    let tbl = population.subsample(SUBSAMPLE, SEED)?;
    println!("subsample of {} rows from {}:\n", tbl.len(), population.len());
    println!("{}", tbl);

    let y = tbl.strength();
    let settings = SamplerSettings {
        burn_in : BURN_IN,
        iterations : ITERATIONS,
        chains : CHAINS,
        seed : SEED,
        progress : true,
        ..Default::default()
    };

    // Model A: strength ~ temperature + pressure
    let xa = Design::Linear.matrix(&tbl)?;
    let (model_a, chain_a) = fit_model("linear", Design::Linear, &y, &xa, settings)?;
    let marg_a = summarize(&chain_a)?;
    println!("posterior marginals ({}):", model_a.name());
    for m in &marg_a {
        println!("  {}", m);
    }
    println!("precision step acceptance: {:.3}\n", chain_a.accept_rate());

    // Model B: strength ~ pressure/temperature
    let xb = Design::Ratio.matrix(&tbl)?;
    let (model_b, chain_b) = fit_model("ratio", Design::Ratio, &y, &xb, settings)?;
    let marg_b = summarize(&chain_b)?;
    println!("posterior marginals ({}):", model_b.name());
    for m in &marg_b {
        println!("  {}", m);
    }
    println!("precision step acceptance: {:.3}\n", chain_b.accept_rate());

    // Predictive samples paired with the observed rows, then the comparison
    let pred_a = posterior_predictive(&chain_a, &xa, SEED)?;
    let pred_b = posterior_predictive(&chain_b, &xb, SEED)?;
    let cmp = Comparison::new(
        ModelScore {
            name : model_a.name().to_string(),
            mse : mse(&y, &pred_a)?,
            dic : dic(&chain_a, &y, &xa)?
        },
        ModelScore {
            name : model_b.name().to_string(),
            mse : mse(&y, &pred_b)?,
            dic : dic(&chain_b, &y, &xb)?
        }
    );
    println!("{}\n", cmp);

    // Acceptance-rejection illustration from the summarized posterior of
    // the preferred model's design
    let rej = rejection_sample(&model_a, &marg_a, &xa, &RejectionSettings {
        trials : REJECTION_TRIALS,
        envelope : ENVELOPE,
        seed : SEED
    })?;
    println!(
        "acceptance-rejection: accepted {} of {} trials (rate {:.4}, {} skipped)",
        rej.accepted.len(),
        rej.trials,
        rej.acceptance_rate(),
        rej.skipped
    );
    Ok(())
}

/// Seeds the coefficient priors at the least squares fit and the noise
/// precision prior at the inverse residual variance, then runs the engine.
fn fit_model(
    name : &str,
    design : Design,
    y : &nalgebra::DVector<f64>,
    x : &nalgebra::DMatrix<f64>,
    settings : SamplerSettings
) -> Result<(RegressionModel, polyreg::sim::Chain)> {
    let ols = Ols::estimate(y, x, Default::default())?;
    let resid_var = ols.resid_var().unwrap_or(1.0);
    let noise = NormalPrior::new("tau", 1.0 / resid_var, NOISE_PRECISION)?;
    let model = RegressionModel::centered_at(name, design, &ols.beta, COEF_PRECISION, noise)?;
    println!("{}", model);
    let chain = Gibbs::new(settings).run(&model, y, x)?;
    Ok((model, chain))
}
