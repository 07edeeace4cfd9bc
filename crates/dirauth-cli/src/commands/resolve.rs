//! resolve command - look up a user and print the resolved identity

use super::CommandContext;
use crate::connection::connect;
use anyhow::{Context, Result};
use dirauth_ldap::{LdapUserProvider, UserProvider};
use tracing::warn;

pub async fn execute(ctx: &CommandContext, username: &str) -> Result<()> {
    let session = connect(&ctx.config.ldap).await?;
    let provider = LdapUserProvider::new("ldap", session.clone(), ctx.options.clone())?;

    let result = provider.load_by_username(username).await;

    if let Err(e) = session.unbind().await {
        warn!("Unbind failed: {}", e);
    }

    let identity = result.with_context(|| format!("Failed to resolve user {}", username))?;
    ctx.print_json(&identity)
}
