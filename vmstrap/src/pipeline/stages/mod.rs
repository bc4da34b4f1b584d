//! Install stages.
//!
//! Each stage is a function with typed input/output.
//!
//! ## Stage Order
//!
//! ```text
//! Validate ──→ Fetch ──→ Provision ──→ Populate ──→ Configure
//!               │            │
//!               │            └── first destructive stage
//!               └── last stage that only reads the host
//! ```

pub mod configure;
pub mod fetch;
pub mod populate;
pub mod provision;
pub mod validate;
