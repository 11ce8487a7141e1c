//! Serialized wire contracts.
//!
//! All REST bodies are JSON with snake_case fields. Field elements travel as
//! decimal strings; addresses and roots as `0x`-prefixed hex; ticks as signed
//! integers (the circuit-internal offset form never appears on the wire).

/// Request/response bodies for the ASP REST surface.
pub mod ops;
/// Pool identification and fee tiers.
pub mod pool;
