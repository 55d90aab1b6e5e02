use thiserror::Error;

/// Errors raised while building or solving an energy system model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Duplicate node label: {0}")]
    DuplicateLabel(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Flow {from} -> {to} must connect a bus")]
    NotABus { from: String, to: String },

    #[error("Flow {from} -> {to} is defined more than once")]
    DuplicateFlow { from: String, to: String },

    #[error("Invalid time index: {0}")]
    InvalidTimeIndex(String),

    #[error("Sequence '{name}' has {actual} values, time index has {expected}")]
    SequenceLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid flow {from} -> {to}: {message}")]
    InvalidFlow {
        from: String,
        to: String,
        message: String,
    },

    #[error("Constraint rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    #[error("Solver '{0}' is not compiled in (enable the '{0}' feature or pick --solver minilp)")]
    SolverUnavailable(String),

    #[error("Model is infeasible")]
    Infeasible,

    #[error("Model is unbounded")]
    Unbounded,

    #[error("Solver error: {0}")]
    Solver(String),
}

impl ModelError {
    pub(crate) fn invalid_flow(from: &str, to: &str, message: impl Into<String>) -> Self {
        ModelError::InvalidFlow {
            from: from.to_string(),
            to: to.to_string(),
            message: message.into(),
        }
    }
}

pub type ModelResult<T> = std::result::Result<T, ModelError>;
