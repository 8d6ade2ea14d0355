//! Verify-then-submit workflow and its HTTP surface.
//!
//! `verify` and `submit` are independent: nothing binds a submission to an
//! earlier successful lookup, so the names a caller submits are taken as given.

pub mod error;
pub mod router;
pub mod service;

pub use error::RegistrationError;
pub use router::registration_router;
pub use service::{RegistrationService, SubmitRequest, VerifyRequest};

#[cfg(test)]
mod tests;
