//! Flight Record Validation
//!
//! Rejects malformed or out-of-domain records before they reach the
//! feature encoder.

mod error;
mod validator;

pub use error::ValidationError;
pub use validator::{ValidationConfig, ValidationResult, Validator};
