//! CLI command implementations

pub mod check;
pub mod resolve;

use dirauth_core::DirauthConfig;
use dirauth_ldap::ResolverOptions;

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirauthConfig,
    pub options: ResolverOptions,
}

impl CommandContext {
    /// Print a value as pretty JSON on stdout
    pub fn print_json<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
