//! GSTIN verification and registration capture.

pub mod config;
pub mod error;
pub mod gstin;
pub mod registration;
pub mod submissions;
pub mod telemetry;
pub mod verification;
