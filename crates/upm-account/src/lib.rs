//! Logging a build agent in to a package registry: resolve the step inputs,
//! get a token, make sure the registry accepts it, and record it in the
//! per-user UPM config file for the package manager to pick up.

pub mod error;
pub mod inputs;
pub mod login;
pub mod upmconfig;

pub use error::UpmAccountError;
