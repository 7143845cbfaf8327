mod core;
pub mod noise;
pub mod protocols;
pub mod random;
pub mod response;
pub mod statistics;

pub use crate::core::{
    BellState, Detection, MeasurementOutcome, Povm, QuantumState, QubitState, errors, utils,
};
pub use crate::protocols::qkd::sifting::SiftedKeyPair;
pub use crate::random::RandomSource;
pub use crate::response::SimulationResponse;
pub use crate::statistics::{KeyStatistics, Verdict};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
