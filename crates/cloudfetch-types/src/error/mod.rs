//! Typed error definitions for cloudfetch.
//!
//! Every resolution step returns one of these values instead of unwinding, and
//! the HTTP layer turns them into a JSON envelope in exactly one place.

mod config;
mod proxy;

pub use config::ConfigError;
pub use proxy::{ErrorCategory, ProxyError};
