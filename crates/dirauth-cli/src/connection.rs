//! Directory connection setup
//!
//! Opens one connection, applies STARTTLS when configured and binds with
//! the service account. Anonymous when no bind DN is set.

use anyhow::{bail, Context, Result};
use dirauth_core::config::LdapConnectionConfig;
use dirauth_ldap::Ldap3Session;
use ldap3::{LdapConnAsync, LdapConnSettings};
use std::time::Duration;
use tracing::debug;

pub async fn connect(config: &LdapConnectionConfig) -> Result<Ldap3Session> {
    let settings = LdapConnSettings::new()
        .set_conn_timeout(Duration::from_secs(config.timeout_seconds))
        .set_starttls(config.start_tls);

    debug!("Connecting to LDAP server: {}", config.server_url);

    let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &config.server_url)
        .await
        .with_context(|| format!("Failed to connect to LDAP server: {}", config.server_url))?;

    ldap3::drive!(conn);

    if config.is_anonymous() {
        debug!("No bind DN configured, using anonymous session");
    } else {
        let result = ldap
            .simple_bind(&config.bind_dn, &config.bind_password)
            .await
            .context("Service bind failed")?;

        if result.rc != 0 {
            bail!("Service account bind failed with code: {}", result.rc);
        }

        debug!("Bound as {}", config.bind_dn);
    }

    Ok(Ldap3Session::new(ldap))
}
