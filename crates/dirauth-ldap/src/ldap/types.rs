//! Resolver options and identity types
//!
//! Supports:
//! - Two-level option merging (mappings merge key-by-key, scalars replace)
//! - Group DN to role mapping
//! - Resolved identities and the principals a host may hand back

use crate::error::{ResolveError, ResolveResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ============================================================================
// Resolver Options
// ============================================================================

/// Substitution site in filter templates
pub const USERNAME_PLACEHOLDER: &str = "%s";

/// Fully resolved resolver options
///
/// Serde keys follow the provider configuration surface, so a partial
/// JSON/TOML table of overrides can be merged straight onto the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverOptions {
    /// Attribute used as the authoritative identity key (`dn` = entry DN)
    #[serde(rename = "authName")]
    pub auth_name: String,

    /// Group DN to role name
    pub roles: BTreeMap<String, String>,

    /// Group search filter template, e.g. "memberuid=%s"
    #[serde(rename = "groupfilter")]
    pub group_filter: String,

    /// User search filter template, e.g. "uid=%s"
    #[serde(rename = "filter")]
    pub user_filter: String,

    /// Fixed filter selecting the disabled-accounts group
    #[serde(rename = "disabledGroup")]
    pub disabled_group: String,

    /// Attribute of the disabled-accounts group listing disabled usernames
    #[serde(rename = "memberAttribute")]
    pub member_attribute: String,

    /// Base DN for user searches
    #[serde(rename = "baseDn")]
    pub base_dn: Option<String>,

    /// Base DN for group and disabled-account searches
    #[serde(rename = "groupDn")]
    pub group_dn: Option<String>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            auth_name: "dn".to_string(),
            roles: BTreeMap::new(),
            group_filter: "memberuid=%s".to_string(),
            user_filter: "uid=%s".to_string(),
            disabled_group: "cn=com.apple.access_disabled".to_string(),
            member_attribute: "memberuid".to_string(),
            base_dn: None,
            group_dn: None,
        }
    }
}

impl ResolverOptions {
    /// Merge overrides onto the built-in defaults
    pub fn with_overrides(overrides: &Value) -> ResolveResult<Self> {
        merge_options(&Self::default(), overrides)
    }

    /// Build user search filter with username substitution
    pub fn build_user_filter(&self, username: &str) -> String {
        substitute(&self.user_filter, username)
    }

    /// Build group search filter with username substitution
    pub fn build_group_filter(&self, username: &str) -> String {
        substitute(&self.group_filter, username)
    }

    /// Map group DNs to the deduplicated set of roles.
    /// Groups without a mapping contribute nothing.
    pub fn map_groups_to_roles<I, S>(&self, groups: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        groups
            .into_iter()
            .filter_map(|group| self.roles.get(group.as_ref()).cloned())
            .collect()
    }

    /// Validate options
    pub fn validate(&self) -> ResolveResult<()> {
        check_template("filter", &self.user_filter)?;
        check_template("groupfilter", &self.group_filter)?;

        if self.disabled_group.trim().is_empty() {
            return Err(ResolveError::Configuration(
                "disabledGroup filter is required".to_string(),
            ));
        }

        if self.auth_name.trim().is_empty() {
            return Err(ResolveError::Configuration(
                "authName attribute is required".to_string(),
            ));
        }

        if self.member_attribute.trim().is_empty() {
            return Err(ResolveError::Configuration(
                "memberAttribute is required".to_string(),
            ));
        }

        Ok(())
    }
}

fn substitute(template: &str, username: &str) -> String {
    template.replacen(USERNAME_PLACEHOLDER, &ldap3::ldap_escape(username), 1)
}

fn check_template(key: &str, template: &str) -> ResolveResult<()> {
    match template.matches(USERNAME_PLACEHOLDER).count() {
        1 => Ok(()),
        n => Err(ResolveError::Configuration(format!(
            "{} must contain exactly one {} placeholder, found {}",
            key, USERNAME_PLACEHOLDER, n
        ))),
    }
}

/// Overlay `overrides` onto `defaults`.
///
/// Merging is two levels deep: where the default is a mapping (`roles`), the
/// override's keys replace or extend the default keys and default keys absent
/// from the override survive. Every other key is replaced outright. An
/// override whose shape differs from the default's is rejected.
pub fn merge_options(defaults: &ResolverOptions, overrides: &Value) -> ResolveResult<ResolverOptions> {
    let overrides = match overrides {
        Value::Null => return Ok(defaults.clone()),
        Value::Object(map) => map,
        other => {
            return Err(ResolveError::Configuration(format!(
                "Options must be a mapping, got {}",
                value_kind(other)
            )))
        }
    };

    let mut merged = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(ResolveError::Configuration(
                "Default options are not a mapping".to_string(),
            ))
        }
        Err(e) => return Err(ResolveError::Configuration(e.to_string())),
    };

    for (key, value) in overrides {
        match merged.get_mut(key) {
            None => {
                return Err(ResolveError::Configuration(format!(
                    "Unknown option: {}",
                    key
                )))
            }
            Some(Value::Object(current)) => match value {
                Value::Object(entries) => {
                    for (entry_key, entry_value) in entries {
                        current.insert(entry_key.clone(), entry_value.clone());
                    }
                }
                other => {
                    return Err(ResolveError::Configuration(format!(
                        "Option {} expects a mapping, got {}",
                        key,
                        value_kind(other)
                    )))
                }
            },
            Some(slot) => {
                if value.is_object() || value.is_array() {
                    return Err(ResolveError::Configuration(format!(
                        "Option {} expects a scalar, got {}",
                        key,
                        value_kind(value)
                    )));
                }
                *slot = value.clone();
            }
        }
    }

    let options: ResolverOptions = serde_json::from_value(Value::Object(merged))
        .map_err(|e| ResolveError::Configuration(format!("Invalid options: {}", e)))?;
    options.validate()?;

    Ok(options)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Identity resolved from the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Username as requested
    pub username: String,

    /// Value of the `authName` attribute on the user entry
    pub auth_name: String,

    /// Roles mapped from group membership
    pub roles: BTreeSet<String>,

    /// False when the user is listed in the disabled-accounts group
    pub enabled: bool,
}

impl Identity {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// ============================================================================
// Principal
// ============================================================================

/// Principals a host framework may ask a provider to refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Identity produced by a directory provider
    Directory(Identity),
    /// Access-key credential holder
    AccessKey(String),
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Directory,
    AccessKey,
    Anonymous,
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Directory(_) => PrincipalKind::Directory,
            Principal::AccessKey(_) => PrincipalKind::AccessKey,
            Principal::Anonymous => PrincipalKind::Anonymous,
        }
    }
}

impl From<Identity> for Principal {
    fn from(identity: Identity) -> Self {
        Principal::Directory(identity)
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrincipalKind::Directory => write!(f, "directory"),
            PrincipalKind::AccessKey => write!(f, "access_key"),
            PrincipalKind::Anonymous => write!(f, "anonymous"),
        }
    }
}
