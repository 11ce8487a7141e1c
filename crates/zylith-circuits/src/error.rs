//! Error types for the builders.

use zylith_core::{CircuitKind, CoreError};

/// Rejections raised while assembling circuit inputs.
///
/// Everything except [`BuildError::PublicCount`] is a caller error: the
/// request violates an algebraic constraint the circuit enforces. A public
/// count mismatch is a programming error in the builder itself.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    /// Field/hash layer failure.
    #[error("hash: {0}")]
    Core(#[from] CoreError),

    /// `tokenIn == tokenOut`.
    #[error("token_in and token_out must differ")]
    TokenEqual,

    /// `token0 >= token1` as field-valued integers.
    #[error("token_0 must order below token_1")]
    TokenOrder,

    /// The spent note's token does not match the declared token.
    #[error("input note token does not match {0}")]
    TokenMismatch(&'static str),

    /// Two of the operation's nullifiers coincide.
    #[error("nullifiers must be pairwise distinct")]
    DuplicateNullifier,

    /// The input amount exceeds the note balance.
    #[error("amount exceeds the input note balance")]
    AmountExceedsBalance,

    /// A zero amount where a positive one is required.
    #[error("amount must be positive")]
    ZeroAmount,

    /// A zero liquidity where a positive one is required.
    #[error("liquidity must be positive")]
    ZeroLiquidity,

    /// A Merkle path with the wrong number of levels.
    #[error("merkle path must have {expected} levels, got {actual}")]
    PathLength {
        /// Expected tree height.
        expected: usize,
        /// Levels provided.
        actual: usize,
    },

    /// The two input proofs were taken against different roots.
    #[error("input proofs must share one tree snapshot")]
    RootMismatch,

    /// Builder produced the wrong number of public signals.
    #[error("circuit {circuit} declares {expected} public signals, built {actual}")]
    PublicCount {
        /// The circuit being built.
        circuit: CircuitKind,
        /// Declared count.
        expected: usize,
        /// Count actually produced.
        actual: usize,
    },
}
