//! Directory identity resolution
//!
//! Runs the user, group and disabled-account searches in order and folds
//! them into an [`Identity`]. A missing user fails before any group search.

use crate::error::{ResolveError, ResolveResult, SearchStage};
use crate::ldap::session::{DirectorySession, SearchRequest, DN_ATTRIBUTE};
use crate::ldap::types::*;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Resolve `username` into an identity using an already-bound session.
///
/// When the user filter matches several entries the first one in result
/// order is used.
pub async fn resolve<S>(
    username: &str,
    session: &S,
    options: &ResolverOptions,
) -> ResolveResult<Identity>
where
    S: DirectorySession + ?Sized,
{
    // Step 1: Find the user entry
    let filter = options.build_user_filter(username);
    debug!("Searching for user with filter: {}", filter);

    let users = session
        .search(SearchRequest::new(filter, options.base_dn.as_deref()))
        .await
        .map_err(|source| ResolveError::UserLookupFailed {
            username: username.to_string(),
            source,
        })?;

    let matched = users.len();
    let user = users
        .into_iter()
        .next()
        .ok_or_else(|| ResolveError::UserNotFound {
            username: username.to_string(),
        })?;

    if matched > 1 {
        warn!(
            "User filter matched {} entries for {}, using {}",
            matched, username, user.dn
        );
    }

    let auth_name = user
        .first(&options.auth_name)
        .map(str::to_string)
        .unwrap_or_else(|| username.to_string());

    debug!("Found user DN: {}", user.dn);

    // Step 2: Map group memberships to roles
    let filter = options.build_group_filter(username);
    debug!("Searching groups with filter: {}", filter);

    let groups = session
        .search(
            SearchRequest::new(filter, options.group_dn.as_deref()).attributes([DN_ATTRIBUTE]),
        )
        .await
        .map_err(|source| ResolveError::DirectoryUnavailable {
            stage: SearchStage::Groups,
            source,
        })?;

    debug!("Found {} groups for user", groups.len());

    let roles = options.map_groups_to_roles(groups.iter().filter_map(|g| g.first(DN_ATTRIBUTE)));

    // Step 3: Check the disabled-accounts group
    let disabled = session
        .search(
            SearchRequest::new(options.disabled_group.as_str(), options.group_dn.as_deref())
                .attributes([options.member_attribute.as_str()]),
        )
        .await
        .map_err(|source| ResolveError::DirectoryUnavailable {
            stage: SearchStage::DisabledAccounts,
            source,
        })?;

    let enabled = match disabled.first() {
        Some(entry) => !entry
            .values(&options.member_attribute)
            .iter()
            .any(|member| member == username),
        None => {
            debug!(
                "No disabled-accounts entry for filter {}, treating nobody as disabled",
                options.disabled_group
            );
            true
        }
    };

    if !enabled {
        warn!("Directory account is disabled: {}", username);
    }

    info!(
        "Resolved user {} with {} role(s), enabled={}",
        username,
        roles.len(),
        enabled
    );

    Ok(Identity {
        username: username.to_string(),
        auth_name,
        roles,
        enabled,
    })
}

/// Contract a host authentication framework consumes
#[async_trait]
pub trait UserProvider: Send + Sync {
    /// Resolve a user by name
    async fn load_by_username(&self, username: &str) -> ResolveResult<Identity>;

    /// Re-resolve a previously issued principal
    async fn refresh(&self, principal: &Principal) -> ResolveResult<Identity>;

    /// Whether this provider issues principals of `kind`
    fn supports(&self, kind: PrincipalKind) -> bool;
}

/// Directory-backed user provider
pub struct LdapUserProvider<S> {
    name: String,
    session: S,
    options: ResolverOptions,
}

impl<S: DirectorySession> LdapUserProvider<S> {
    /// Create a provider from resolved options
    pub fn new(name: impl Into<String>, session: S, options: ResolverOptions) -> ResolveResult<Self> {
        options.validate()?;

        Ok(Self {
            name: name.into(),
            session,
            options,
        })
    }

    /// Create a provider from overrides merged onto the defaults
    pub fn with_overrides(
        name: impl Into<String>,
        session: S,
        overrides: &Value,
    ) -> ResolveResult<Self> {
        let options = ResolverOptions::with_overrides(overrides)?;
        Self::new(name, session, options)
    }

    /// Service name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Get underlying session
    pub fn session(&self) -> &S {
        &self.session
    }
}

#[async_trait]
impl<S: DirectorySession> UserProvider for LdapUserProvider<S> {
    async fn load_by_username(&self, username: &str) -> ResolveResult<Identity> {
        debug!("[{}] Loading user: {}", self.name, username);
        resolve(username, &self.session, &self.options).await
    }

    async fn refresh(&self, principal: &Principal) -> ResolveResult<Identity> {
        match principal {
            Principal::Directory(identity) => self.load_by_username(&identity.username).await,
            other => Err(ResolveError::UnsupportedPrincipal(other.kind())),
        }
    }

    fn supports(&self, kind: PrincipalKind) -> bool {
        kind == PrincipalKind::Directory
    }
}
