//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Remote: HTTP and SSE client of the generation service
//! - Persistence: SQLite storage for saved sets
//! - HTTP: REST API routes
//! - WebSocket: live session snapshots for the console shell
//! - Config: Application configuration
//! - State: Shared application state
//! - Session: Console session registry

pub mod config;
pub mod http;
pub mod persistence;
pub mod remote;
pub mod session;
pub mod state;
pub mod websocket;

#[cfg(test)]
pub(crate) mod testing;
