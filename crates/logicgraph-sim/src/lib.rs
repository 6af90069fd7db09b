pub mod error;
pub mod fingerprint;
pub mod simulator;
pub mod stimulus;
pub mod trace;

pub use error::SimError;
pub use simulator::{SimConfig, SimState, Simulator};
pub use stimulus::RandomStimulus;
pub use trace::TickTrace;
