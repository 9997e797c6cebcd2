//! Server module for NextMonth
//!
//! Contains the main server initialization and runtime logic.
//!
//! # Module Structure
//!
//! - `config`: Configuration structures for all server components
//! - `adapters`: Store adapter for the terminal audit seam
//! - `loader`: Configuration loading from files and environment
//! - `validation`: Production configuration validation
//! - `shutdown`: Signal handling
//! - `init`: Main server initialization and run loop

pub mod adapters;
pub mod config;
mod init;
mod loader;
mod shutdown;
mod validation;

// Re-export public API
pub use config::AppConfig;
pub use init::{build_router, run, serve, ServerContext};
pub use loader::load_config;
