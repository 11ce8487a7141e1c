//! Zylith core primitives.
//!
//! BN254 scalar arithmetic and circom-compatible Poseidon hashing, the
//! note/position commitment scheme, tick and amount transforms, and the REST
//! wire schema shared by the ASP service and the SDK client.

/// 256-bit amounts split into u128 halves for circuit consumption.
pub mod amount;
/// Circuit identifiers and their public-input layout.
pub mod circuit;
/// Note and position commitment equations.
pub mod commitment;
/// Error types for the core layer.
pub mod error;
/// BN254 scalar field wrapper with checked wire conversions.
pub mod field;
/// Poseidon hashing handle (circomlib BN254 parameterization).
pub mod poseidon;
/// Serialized wire contracts shared across the workspace.
pub mod schema;
/// Signed/offset tick representations.
pub mod ticks;

pub use amount::Amount;
pub use circuit::CircuitKind;
pub use error::CoreError;
pub use field::FieldElement;
pub use poseidon::PoseidonHasher;
pub use ticks::{OffsetTick, Tick};
