//! Directory-backed identity resolution for Dirauth

pub mod error;
pub mod ldap;

pub use error::{DirectoryError, ResolveError, ResolveResult, SearchStage};
pub use ldap::{
    merge_options, resolve, DirectoryEntry, DirectorySession, Identity, Ldap3Session,
    LdapUserProvider, Principal, PrincipalKind, ResolverOptions, SearchRequest, UserProvider,
};
