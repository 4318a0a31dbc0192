use thiserror::Error;

/// Failures that can arise while loading the observation table, declaring
/// priors, or running the samplers. Malformed priors and degenerate designs
/// are configuration bugs surfaced at construction time; every variant here
/// is fatal for a one-shot analysis (there is no recovery path).
#[derive(Debug, Error)]
pub enum Error {

    #[error("could not read table: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse table: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}' in table header")]
    MissingColumn(String),

    #[error("malformed value '{value}' at line {line} (column '{column}')")]
    MalformedValue { line : usize, column : String, value : String },

    #[error("table holds no data rows")]
    EmptyTable,

    #[error("subsample of size {requested} requested from population of {available}")]
    SubsampleSize { requested : usize, available : usize },

    #[error("prior precision for '{name}' must be positive (got {precision})")]
    InvalidPrecision { name : String, precision : f64 },

    #[error("normal parameters must be finite with positive dispersion (mean {mean}, sd {sd})")]
    InvalidNormal { mean : f64, sd : f64 },

    #[error("model '{model}' expects {expected} coefficient priors (got {given})")]
    PriorCount { model : String, expected : usize, given : usize },

    #[error("design produced a non-finite predictor at row {0}")]
    DegenerateDesign(usize),

    #[error("cross-product matrix is singular")]
    SingularSystem,

    #[error("initial noise precision must be positive (got {0})")]
    InvalidInitial(f64),

    #[error("paired sequences differ in length ({0} vs. {1})")]
    LengthMismatch(usize, usize),

    #[error("chain holds no retained draws")]
    EmptyChain,

    #[error("dimension mismatch: {context} (expected {expected}, got {given})")]
    Dimension { context : &'static str, expected : usize, given : usize },

    #[error("could not serialize model: {0}")]
    Json(#[from] serde_json::Error),
}
