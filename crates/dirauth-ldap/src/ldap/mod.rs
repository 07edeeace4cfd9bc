//! LDAP identity provider
//!
//! Resolves a username into an [`Identity`] with three directory searches:
//! - the user entry itself
//! - the groups listing the user, mapped to roles
//! - the disabled-accounts group, deciding the enabled flag
//!
//! The caller supplies an already-bound [`DirectorySession`]; this module
//! never opens connections or verifies passwords.

mod client;
mod session;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{resolve, LdapUserProvider, UserProvider};
pub use session::{DirectoryEntry, DirectorySession, Ldap3Session, SearchRequest};
pub use types::*;
