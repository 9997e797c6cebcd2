//! WebSocket module for NextMonth
//!
//! Provides real-time communication endpoints:
//! - /ws - Interactive terminal sessions

pub mod terminal;

pub use terminal::terminal_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new().route("/ws", get(terminal_handler))
}
