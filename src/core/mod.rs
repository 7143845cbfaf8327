pub mod errors;
mod measurements;
mod state;
pub mod utils;

pub use measurements::{
    Detection, MeasurementOutcome, Povm, analyzer_projector, same_outcome_probability,
};
pub use state::{BellState, QuantumState, QubitState};
