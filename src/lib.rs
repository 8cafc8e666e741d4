//! wolf - minimal chat relay for the Groq completion API
//!
//! This library provides the configuration, error types and HTTP relay
//! behind the `wolf` binary.

pub mod config;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use error::{Error, Result};
