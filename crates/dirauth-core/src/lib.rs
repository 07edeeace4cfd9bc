//! Dirauth Core Library
//!
//! Shared error type and application configuration for the dirauth
//! directory identity resolver.

pub mod config;
pub mod error;

pub use config::DirauthConfig;
pub use error::{Error, Result};

/// Dirauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default directory server URL
pub const DEFAULT_LDAP_URL: &str = "ldap://localhost:389";
