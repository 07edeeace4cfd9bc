//! Identity resolution error types

use crate::ldap::PrincipalKind;
use std::fmt;
use thiserror::Error;

/// Result type for identity resolution
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Fault raised by a directory session while searching
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Directory transport error: {0}")]
    Transport(String),

    #[error("Directory returned result code {code}: {message}")]
    Protocol { code: u32, message: String },
}

impl From<ldap3::LdapError> for DirectoryError {
    fn from(err: ldap3::LdapError) -> Self {
        match err {
            ldap3::LdapError::LdapResult { result } => DirectoryError::Protocol {
                code: result.rc,
                message: result.text,
            },
            other => DirectoryError::Transport(other.to_string()),
        }
    }
}

/// Search issued after the user entry was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    Groups,
    DisabledAccounts,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStage::Groups => write!(f, "group membership"),
            SearchStage::DisabledAccounts => write!(f, "disabled accounts"),
        }
    }
}

/// Identity resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unknown user: username={username}")]
    UserNotFound { username: String },

    #[error("Directory search failed for user: username={username}")]
    UserLookupFailed {
        username: String,
        #[source]
        source: DirectoryError,
    },

    #[error("Directory unavailable during {stage} search")]
    DirectoryUnavailable {
        stage: SearchStage,
        #[source]
        source: DirectoryError,
    },

    #[error("Principals of kind \"{0}\" are not supported")]
    UnsupportedPrincipal(PrincipalKind),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ResolveError {
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::UserNotFound { .. } => "UserNotFound",
            ResolveError::UserLookupFailed { .. } => "UserLookupFailed",
            ResolveError::DirectoryUnavailable { .. } => "DirectoryUnavailable",
            ResolveError::UnsupportedPrincipal(_) => "UnsupportedPrincipalType",
            ResolveError::Configuration(_) => "ConfigurationError",
        }
    }

    /// Username carried by user lookup failures
    pub fn username(&self) -> Option<&str> {
        match self {
            ResolveError::UserNotFound { username }
            | ResolveError::UserLookupFailed { username, .. } => Some(username),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_ldap_result_maps_to_protocol() {
        let err: DirectoryError = ldap3::LdapError::LdapResult {
            result: ldap3::LdapResult {
                rc: 32,
                matched: String::new(),
                text: "No such object".to_string(),
                refs: vec![],
                ctrls: vec![],
            },
        }
        .into();

        assert_eq!(
            err,
            DirectoryError::Protocol {
                code: 32,
                message: "No such object".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_failure_keeps_source() {
        let err = ResolveError::UserLookupFailed {
            username: "alice".to_string(),
            source: DirectoryError::Transport("connection reset".to_string()),
        };

        assert_eq!(err.code(), "UserLookupFailed");
        assert_eq!(err.username(), Some("alice"));
        assert!(err
            .source()
            .map(|s| s.to_string().contains("connection reset"))
            .unwrap_or(false));
    }

    #[test]
    fn test_messages() {
        let err = ResolveError::UserNotFound {
            username: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown user: username=ghost");

        let err = ResolveError::UnsupportedPrincipal(PrincipalKind::AccessKey);
        assert_eq!(
            err.to_string(),
            "Principals of kind \"access_key\" are not supported"
        );
        assert_eq!(err.username(), None);
    }
}
