//! Operation and read handlers.

/// `POST /burn`.
pub mod burn;
/// `POST /deposit`.
pub mod deposit;
/// `POST /mint`.
pub mod mint;
/// Read endpoints.
pub mod reads;
/// `POST /swap`.
pub mod swap;
/// `POST /withdraw`.
pub mod withdraw;
