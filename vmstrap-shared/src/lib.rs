//! vmstrap shared - error types and fixed provisioning policy.
//!
//! This crate contains the pieces every other vmstrap crate agrees on:
//! the error taxonomy and the constants that pin the single supported
//! disk layout, artifact source and first-boot settings.

pub mod constants;
pub mod errors;

pub use errors::{VmstrapError, VmstrapResult};
