use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Invalid probability for `{name}`: {value}. Must be between 0.0 and 1.0")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Invalid value for `{name}`: {value}. Must be finite and non-negative")]
    InvalidQuantity { name: &'static str, value: f64 },

    #[error("Signal count {count} exceeds the per-run limit of {limit}")]
    TooManySignals { count: usize, limit: usize },

    #[error("Unknown Bell state: {0}. Expected psi_minus, psi_plus, phi_minus or phi_plus")]
    UnknownBellState(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasurementError {
    #[error("Number of POVM elements ({ops}) does not match number of outcomes ({vals})")]
    CountMismatch { ops: usize, vals: usize },

    #[error("POVM elements do not sum to Identity (Completeness relation failed)")]
    NotComplete,

    #[error("POVM element {0} is not Hermitian")]
    NonHermitian(usize),

    #[error("Invalid operator dimensions")]
    InvalidDimensions,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    #[error("Measurement error: {0}")]
    MeasurementError(#[from] MeasurementError),
}

/// Top-level failure of a protocol run.
///
/// Separates caller mistakes from failures of the simulator itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterError),

    #[error("Internal simulation error: {0}")]
    Internal(#[from] StateError),
}

impl From<MeasurementError> for SimulationError {
    fn from(err: MeasurementError) -> Self {
        SimulationError::Internal(StateError::MeasurementError(err))
    }
}

impl SimulationError {
    /// Machine-readable tag used by the response envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::InvalidParameters(_) => "invalid_parameters",
            SimulationError::Internal(_) => "internal",
        }
    }
}
