//! Directory session abstraction
//!
//! The resolver only needs "search with a filter under a base". Hosts hand
//! in any [`DirectorySession`]; [`Ldap3Session`] adapts an already-bound
//! `ldap3` handle.

use crate::error::DirectoryError;
use async_trait::async_trait;
use ldap3::{Ldap, LdapResult, Scope, SearchEntry, SearchOptions};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Pseudo-attribute naming the entry's distinguished name
pub const DN_ATTRIBUTE: &str = "dn";

/// LDAP selector requesting no attributes at all
const NO_ATTRIBUTES: &str = "1.1";

/// sizeLimitExceeded: the server stopped at the requested cap
const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;

/// Single search result entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn with_attr<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attrs
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// All values of an attribute. Names compare case-insensitively and
    /// `dn` yields the entry DN.
    pub fn values(&self, name: &str) -> &[String] {
        if name.eq_ignore_ascii_case(DN_ATTRIBUTE) {
            return std::slice::from_ref(&self.dn);
        }

        if let Some(values) = self.attrs.get(name) {
            return values;
        }

        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    /// First value of an attribute
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }
}

impl From<SearchEntry> for DirectoryEntry {
    fn from(entry: SearchEntry) -> Self {
        Self {
            dn: entry.dn,
            attrs: entry.attrs,
        }
    }
}

/// Subtree search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub filter: String,
    /// Search base; `None` searches from the directory root
    pub base: Option<String>,
    /// Server-side cap on returned entries
    pub size_limit: Option<i32>,
    /// Attribute projection; empty requests all user attributes
    pub attributes: Vec<String>,
}

impl SearchRequest {
    pub fn new(filter: impl Into<String>, base: Option<&str>) -> Self {
        Self {
            filter: filter.into(),
            base: base.map(str::to_string),
            size_limit: None,
            attributes: Vec::new(),
        }
    }

    pub fn sized(mut self, limit: i32) -> Self {
        self.size_limit = Some(limit);
        self
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Connected, already-authenticated directory session
#[async_trait]
pub trait DirectorySession: Send + Sync {
    /// Run a subtree search and return the matching entries in server order
    async fn search(&self, request: SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

#[async_trait]
impl<T: DirectorySession + ?Sized> DirectorySession for Arc<T> {
    async fn search(&self, request: SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        (**self).search(request).await
    }
}

/// [`DirectorySession`] over an `ldap3` async handle
///
/// The connection must already be driven and bound by the caller.
#[derive(Clone)]
pub struct Ldap3Session {
    ldap: Ldap,
}

impl Ldap3Session {
    pub fn new(ldap: Ldap) -> Self {
        Self { ldap }
    }

    /// Close the underlying connection
    pub async fn unbind(mut self) -> Result<(), DirectoryError> {
        self.ldap.unbind().await?;
        Ok(())
    }
}

#[async_trait]
impl DirectorySession for Ldap3Session {
    async fn search(&self, request: SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        // Handles are cheap clones sharing one connection
        let mut ldap = self.ldap.clone();
        if let Some(limit) = request.size_limit {
            ldap.with_search_options(SearchOptions::new().sizelimit(limit));
        }

        let filter = normalize_filter(&request.filter);
        let attrs = projection(&request.attributes);
        let base = request.base.as_deref().unwrap_or("");

        debug!("Searching base '{}' with filter: {}", base, filter);

        let result = ldap.search(base, Scope::Subtree, &filter, attrs).await?;
        let rs = accept_entries(result.0, result.1, request.size_limit.is_some())?;

        debug!("Search returned {} entries", rs.len());

        Ok(rs
            .into_iter()
            .map(|result| SearchEntry::construct(result).into())
            .collect())
    }
}

/// Keep the entries of a successful search. A capped search that hit its
/// size limit still returns the entries sent before the cap.
fn accept_entries<T>(
    entries: Vec<T>,
    result: LdapResult,
    size_limited: bool,
) -> Result<Vec<T>, DirectoryError> {
    match result.rc {
        0 => Ok(entries),
        RC_SIZE_LIMIT_EXCEEDED if size_limited => {
            debug!("Size limit reached, keeping {} entries", entries.len());
            Ok(entries)
        }
        code => Err(DirectoryError::Protocol {
            code,
            message: result.text,
        }),
    }
}

/// Bare filters such as `uid=alice` are accepted and wrapped in parentheses
fn normalize_filter(filter: &str) -> String {
    let filter = filter.trim();
    if filter.starts_with('(') {
        filter.to_string()
    } else {
        format!("({})", filter)
    }
}

/// The DN is always returned, so a `dn`-only projection asks for no attributes
fn projection(attributes: &[String]) -> Vec<String> {
    if attributes.is_empty() {
        return vec!["*".to_string()];
    }

    let attrs: Vec<String> = attributes
        .iter()
        .filter(|name| !name.eq_ignore_ascii_case(DN_ATTRIBUTE))
        .cloned()
        .collect();

    if attrs.is_empty() {
        vec![NO_ATTRIBUTES.to_string()]
    } else {
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup_ignores_case() {
        let entry = DirectoryEntry::new("cn=com.apple.access_disabled,ou=groups,dc=example,dc=com")
            .with_attr("memberUid", ["bob", "carol"]);

        assert_eq!(entry.values("memberuid"), ["bob", "carol"]);
        assert_eq!(entry.first("MEMBERUID"), Some("bob"));
        assert!(entry.values("member").is_empty());
        assert_eq!(entry.first("member"), None);
    }

    #[test]
    fn test_dn_pseudo_attribute() {
        let entry = DirectoryEntry::new("cn=admins,ou=groups,dc=example,dc=com")
            .with_attr("cn", ["admins"]);

        assert_eq!(entry.first("dn"), Some("cn=admins,ou=groups,dc=example,dc=com"));
        assert_eq!(entry.first("DN"), Some("cn=admins,ou=groups,dc=example,dc=com"));
    }

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("memberuid=alice", Some("ou=groups,dc=example,dc=com"))
            .sized(5)
            .attributes(["dn"]);

        assert_eq!(request.base.as_deref(), Some("ou=groups,dc=example,dc=com"));
        assert_eq!(request.size_limit, Some(5));
        assert_eq!(request.attributes, vec!["dn".to_string()]);

        let request = SearchRequest::new("uid=alice", None);
        assert_eq!(request.base, None);
        assert_eq!(request.size_limit, None);
        assert!(request.attributes.is_empty());
    }

    #[test]
    fn test_normalize_filter() {
        assert_eq!(normalize_filter("uid=alice"), "(uid=alice)");
        assert_eq!(normalize_filter(" (uid=alice) "), "(uid=alice)");
        assert_eq!(
            normalize_filter("(&(objectClass=posixGroup)(memberUid=alice))"),
            "(&(objectClass=posixGroup)(memberUid=alice))"
        );
    }

    fn ldap_result(rc: u32, text: &str) -> LdapResult {
        LdapResult {
            rc,
            matched: String::new(),
            text: text.to_string(),
            refs: vec![],
            ctrls: vec![],
        }
    }

    #[test]
    fn test_capped_search_keeps_entries() {
        let entries = vec!["uid=alice,ou=staff", "uid=alice,ou=contractors"];

        let kept = accept_entries(entries.clone(), ldap_result(4, "Size limit exceeded"), true)
            .unwrap();
        assert_eq!(kept, entries);

        let kept = accept_entries(entries.clone(), ldap_result(0, ""), false).unwrap();
        assert_eq!(kept, entries);
    }

    #[test]
    fn test_size_limit_error_without_cap() {
        let err = accept_entries(vec!["uid=alice"], ldap_result(4, "Size limit exceeded"), false)
            .unwrap_err();
        assert_eq!(
            err,
            DirectoryError::Protocol {
                code: 4,
                message: "Size limit exceeded".to_string()
            }
        );

        let err = accept_entries(Vec::<String>::new(), ldap_result(32, "No such object"), true)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Protocol { code: 32, .. }));
    }

    #[test]
    fn test_projection() {
        assert_eq!(projection(&[]), vec!["*".to_string()]);
        assert_eq!(projection(&["dn".to_string()]), vec!["1.1".to_string()]);
        assert_eq!(
            projection(&["dn".to_string(), "memberuid".to_string()]),
            vec!["memberuid".to_string()]
        );
    }
}
