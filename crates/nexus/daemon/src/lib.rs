//! Sovereign Nexus daemon library
//!
//! This module provides the core components for the `nexusd` daemon:
//! - Configuration loading
//! - REST API handlers over the governance loop
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
