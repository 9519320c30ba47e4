//! Remote generation service adapter

mod client;
pub mod retry;
pub mod sse;

pub use client::RemoteClient;
