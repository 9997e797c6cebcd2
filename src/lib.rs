//! NextMonth - workspace server
//!
//! Serves projects, their file trees and interactive shell sessions bridged
//! over WebSocket, plus a line-oriented terminal client.

#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod server;
pub mod websocket;
