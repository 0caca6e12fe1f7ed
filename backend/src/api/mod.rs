//! HTTP API module.
//!
//! This module provides the HTTP server, response types and the SSE log
//! broadcaster for the dashboard backend.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{build_router, serve_from_env, serve_from_lookup, start_server, AppState};
pub use types::*;
