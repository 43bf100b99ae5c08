//! # Eiei Core
//!
//! Core types, configuration, and validation for the Eiei account service.
//!
//! This crate provides:
//! - Configuration loading and validation (JSON5 format)
//! - Shared identifier types
//! - Input validation and normalisation for account fields
//! - The token signing secret wrapper

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod secrets;
pub mod types;
pub mod validation;

pub use config::{Config, ConfigError};
pub use secrets::{SecretError, SigningSecret};
pub use types::UserId;
pub use validation::ValidationError;
