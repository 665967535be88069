//! Minimal client for npm-compatible registries, covering the two calls a
//! build agent needs to log in: exchanging a username and password for a
//! token, and checking that a token is accepted.

mod api;
mod client;
mod error;
mod notify;
mod secrets;

pub use client::UpmClient;
pub use error::UpmClientError;
pub use secrets::Secrets;
