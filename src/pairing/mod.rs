pub mod machine;
pub mod prediction;

pub use machine::{LoadingBounds, PairingMachine, PairingSnapshot};
pub use prediction::FixedOdds;
