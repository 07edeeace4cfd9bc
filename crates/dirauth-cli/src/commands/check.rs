//! check command - show the effective configuration, optionally testing the bind

use super::CommandContext;
use crate::connection::connect;
use anyhow::Result;
use dirauth_ldap::ResolverOptions;
use serde::Serialize;

#[derive(Serialize)]
struct CheckResult<'a> {
    server_url: &'a str,
    start_tls: bool,
    anonymous: bool,
    connected: Option<bool>,
    options: &'a ResolverOptions,
}

pub async fn execute(ctx: &CommandContext, test_connection: bool) -> Result<()> {
    let connected = if test_connection {
        let session = connect(&ctx.config.ldap).await?;
        session.unbind().await?;
        Some(true)
    } else {
        None
    };

    ctx.print_json(&CheckResult {
        server_url: &ctx.config.ldap.server_url,
        start_tls: ctx.config.ldap.start_tls,
        anonymous: ctx.config.ldap.is_anonymous(),
        connected,
        options: &ctx.options,
    })
}
