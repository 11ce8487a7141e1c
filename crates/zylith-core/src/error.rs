//! Error types for the core layer.

/// Errors produced by the field, hash, tick and amount primitives.
///
/// Messages never echo the offending value: secrets and nullifiers reach
/// these constructors, so errors carry only a structural reason.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    /// Value is not a canonical BN254 scalar.
    #[error("not a canonical BN254 field element: {0}")]
    InvalidField(&'static str),
    /// Poseidon supports arities 1 through 6 only.
    #[error("poseidon arity {0} outside supported range 1..=6")]
    UnsupportedArity(usize),
    /// Underlying Poseidon permutation failure.
    #[error("poseidon: {0}")]
    Poseidon(String),
    /// Tick outside the supported range.
    #[error("tick {0} outside [{min}, {max}]", min = crate::ticks::MIN_TICK, max = crate::ticks::MAX_TICK)]
    TickOutOfRange(i32),
    /// Amount does not fit in 256 bits.
    #[error("amount exceeds 256 bits")]
    AmountOverflow,
    /// Amount string is not a decimal integer.
    #[error("invalid amount: {0}")]
    InvalidAmount(&'static str),
}
