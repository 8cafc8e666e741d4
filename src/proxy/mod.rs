//! HTTP relay module.
//!
//! This module provides the browser-facing HTTP API that accepts chat
//! requests and forwards them to the upstream completion API.

mod handlers;
mod server;
pub mod types;
pub mod upstream;

pub use server::{create_router, run_server, AppState};
pub use types::{ChatRequest, ErrorBody, HealthStatus, UpstreamRequest};
