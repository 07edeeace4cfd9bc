//! Dirauth - directory identity resolution
//!
//! Resolves a username against an LDAP directory into its roles and
//! enabled/disabled status.

mod commands;
mod connection;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::CommandContext;
use dirauth_core::config::LoggingConfig;
use dirauth_core::DirauthConfig;
use dirauth_ldap::ResolverOptions;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirauth")]
#[command(author = "Dirauth Team")]
#[command(version = dirauth_core::VERSION)]
#[command(about = "Resolve directory users into identities and roles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// LDAP server URL (overrides DIRAUTH_LDAP_URL)
    #[arg(long, global = true)]
    server_url: Option<String>,

    /// Service account bind DN (overrides DIRAUTH_BIND_DN)
    #[arg(long, global = true)]
    bind_dn: Option<String>,

    /// Service account password (overrides DIRAUTH_BIND_PASSWORD)
    #[arg(long, global = true)]
    bind_password: Option<String>,

    /// Log level: trace, debug, info, warn, error (overrides DIRAUTH_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a username and print its identity as JSON
    Resolve {
        /// Username to look up
        username: String,
    },

    /// Print the effective configuration
    Check {
        /// Also connect and bind to the directory
        #[arg(long)]
        connect: bool,
    },
}

impl Cli {
    /// Load config from file and `DIRAUTH_*` environment, then apply CLI flags
    fn load_config(&self) -> anyhow::Result<DirauthConfig> {
        let mut config = match &self.config {
            Some(path) => DirauthConfig::from_file(path)?.with_env(),
            None => DirauthConfig::from_env(),
        };

        if let Some(url) = &self.server_url {
            config.ldap.server_url = url.clone();
        }
        if let Some(dn) = &self.bind_dn {
            config.ldap.bind_dn = dn.clone();
        }
        if let Some(password) = &self.bind_password {
            config.ldap.bind_password = password.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // Logs go to stderr so stdout stays machine-readable
    if logging.is_json() {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_logging(&config.logging);

    let overrides = config.provider_overrides()?;
    let options = ResolverOptions::with_overrides(&overrides)
        .context("Invalid [provider] configuration")?;

    debug!("Resolver options: {:?}", options);

    let ctx = CommandContext { config, options };

    match cli.command {
        Commands::Resolve { username } => commands::resolve::execute(&ctx, &username).await,
        Commands::Check { connect } => commands::check::execute(&ctx, connect).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "dirauth",
            "resolve",
            "alice",
            "--server-url",
            "ldaps://ldap.example.com",
        ])
        .unwrap();

        assert!(matches!(&cli.command, Commands::Resolve { username } if username == "alice"));
        assert_eq!(cli.server_url.as_deref(), Some("ldaps://ldap.example.com"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "dirauth",
            "check",
            "--server-url",
            "ldap://ldap.example.com:389",
            "--bind-dn",
            "cn=reader,dc=example,dc=com",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.ldap.server_url, "ldap://ldap.example.com:389");
        assert_eq!(config.ldap.bind_dn, "cn=reader,dc=example,dc=com");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_environment_read_by_config_only() {
        std::env::set_var("DIRAUTH_LOG_LEVEL", "warn");

        let cli = Cli::try_parse_from(["dirauth", "check"]).unwrap();
        let config = cli.load_config();

        std::env::remove_var("DIRAUTH_LOG_LEVEL");

        assert_eq!(cli.log_level, None);
        assert_eq!(config.unwrap().logging.level, "warn");
    }

    #[test]
    fn test_invalid_url_rejected() {
        let cli =
            Cli::try_parse_from(["dirauth", "check", "--server-url", "http://example.com"]).unwrap();

        assert!(cli.load_config().is_err());
    }
}
