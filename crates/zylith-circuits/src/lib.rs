//! Circuit input builders.
//!
//! One builder per circuit. Each takes domain objects (note/position
//! openings, Merkle proofs, fresh output secrets, swap/mint parameters)
//! and produces the exact signal assignment the circuit expects, plus the
//! predicted public-signal block in its fixed order. Algebraic constraints
//! the circuit would reject are checked here first, so an invalid request
//! never reaches the prover.

/// Burn circuit inputs.
pub mod burn;
/// Error types for the builders.
pub mod error;
/// Membership circuit inputs (withdraw).
pub mod membership;
/// Mint circuit inputs.
pub mod mint;
/// Signal assignment containers.
pub mod signals;
/// Swap circuit inputs.
pub mod swap;

pub use burn::burn_inputs;
pub use error::BuildError;
pub use membership::membership_inputs;
pub use mint::mint_inputs;
pub use signals::{CircuitInputs, FreshSecrets, NoteOpening, PositionOpening};
pub use swap::{swap_inputs, SwapSpec};
