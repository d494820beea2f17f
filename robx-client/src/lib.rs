//! HTTP transport layer for the Roblox web API
//!
//! This crate provides the dispatcher every endpoint caller funnels
//! through:
//! - Verb surface (GET/POST/PUT/PATCH/DELETE) returning owned response
//!   snapshots, plus an explicit streaming variant
//! - Transparent session rebinding when the execution context that owned
//!   the connection client has been torn down
//! - Bounded retries for connection failures and the pooled-connection race
//! - Rotating anti-forgery token coordination for mutating verbs

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
mod session;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use retry::{RetryKind, RetryPolicy};
