use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("Empty universe: no symbols supplied")]
    EmptyUniverse,

    #[error("Insufficient data: {rows} aligned rows remain, minimum is {min}")]
    InsufficientData { rows: usize, min: usize },

    #[error("Mismatched universe: {0}")]
    MismatchedUniverse(String),

    #[error("Degenerate criterion '{criterion}': {reason}")]
    DegenerateCriterion { criterion: String, reason: String },

    #[error("Degenerate distance for '{symbol}' in scenario '{scenario}': both ideal points coincide")]
    DegenerateDistance { scenario: String, symbol: String },

    #[error("Invalid probabilities: scenario probabilities sum to {sum}, expected 1")]
    InvalidProbabilities { sum: f64 },

    #[error("Dimension mismatch in scenario '{scenario}': weight vector has {actual} components, criteria list has {expected}")]
    DimensionMismatch {
        scenario: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Provider error: {0}")]
    Provider(String),
}
