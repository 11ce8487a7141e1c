//! Client SDK.
//!
//! Composes the encrypted note vault, the ASP REST client and (in
//! client-side mode) a local prover worker. Public operations mirror the
//! ASP endpoints but take domain-level arguments and keep the vault
//! consistent: outputs are added, inputs are marked spent, and the vault is
//! persisted after every successful operation.

/// ASP REST client.
pub mod asp;
/// The user-facing client.
pub mod client;
/// Error types for the SDK.
pub mod error;

pub use asp::AspClient;
pub use client::{ClientMode, DepositOutcome, ZylithClient};
pub use error::SdkError;
