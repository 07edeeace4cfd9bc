//! Configuration for Dirauth
//!
//! Example config:
//! ```toml
//! [ldap]
//! server_url = "ldap://ldap.example.com:389"
//! bind_dn = "cn=reader,dc=example,dc=com"
//! bind_password = "secret"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [provider]
//! baseDn = "ou=users,dc=example,dc=com"
//! groupDn = "ou=groups,dc=example,dc=com"
//!
//! [provider.roles]
//! "cn=admins,ou=groups,dc=example,dc=com" = "ROLE_ADMIN"
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirauthConfig {
    #[serde(default)]
    pub ldap: LdapConnectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Resolver option overrides, merged onto the resolver defaults.
    /// Keys follow the provider surface (`authName`, `roles`, `filter`, ...).
    #[serde(default)]
    pub provider: toml::Table,
}

impl DirauthConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply `DIRAUTH_*` environment variables on top of this config
    pub fn with_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DIRAUTH_LDAP_URL") {
            self.ldap.server_url = url;
        }
        if let Ok(dn) = std::env::var("DIRAUTH_BIND_DN") {
            self.ldap.bind_dn = dn;
        }
        if let Ok(password) = std::env::var("DIRAUTH_BIND_PASSWORD") {
            self.ldap.bind_password = password;
        }
        if std::env::var("DIRAUTH_START_TLS").map(|v| v == "true").unwrap_or(false) {
            self.ldap.start_tls = true;
        }
        if let Ok(level) = std::env::var("DIRAUTH_LOG_LEVEL") {
            self.logging.level = level;
        }

        // Provider search bases
        if let Ok(base) = std::env::var("DIRAUTH_BASE_DN") {
            self.provider.insert("baseDn".to_string(), toml::Value::String(base));
        }
        if let Ok(base) = std::env::var("DIRAUTH_GROUP_DN") {
            self.provider.insert("groupDn".to_string(), toml::Value::String(base));
        }

        self
    }

    /// Provider overrides as a JSON object, ready for option merging
    pub fn provider_overrides(&self) -> crate::Result<serde_json::Value> {
        serde_json::to_value(&self.provider)
            .map_err(|e| crate::Error::Config(format!("Invalid provider section: {}", e)))
    }

    pub fn validate(&self) -> crate::Result<()> {
        self.ldap.validate()?;
        self.logging.validate()
    }
}

/// Directory server connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConnectionConfig {
    /// LDAP server URL (ldap:// or ldaps://)
    #[serde(default = "default_ldap_url")]
    pub server_url: String,

    /// Use STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Bind DN for directory queries; empty means anonymous
    #[serde(default)]
    pub bind_dn: String,

    /// Bind password
    #[serde(default)]
    pub bind_password: String,

    /// Connection timeout in seconds
    #[serde(default = "default_ldap_timeout")]
    pub timeout_seconds: u64,
}

fn default_ldap_url() -> String {
    crate::DEFAULT_LDAP_URL.to_string()
}

fn default_ldap_timeout() -> u64 {
    10
}

impl Default for LdapConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: default_ldap_url(),
            start_tls: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            timeout_seconds: default_ldap_timeout(),
        }
    }
}

impl LdapConnectionConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if self.server_url.is_empty() {
            return Err(crate::Error::InvalidArgument(
                "Server URL is required".into(),
            ));
        }

        if !self.server_url.starts_with("ldap://") && !self.server_url.starts_with("ldaps://") {
            return Err(crate::Error::InvalidArgument(
                "Server URL must start with ldap:// or ldaps://".into(),
            ));
        }

        if self.start_tls && self.server_url.starts_with("ldaps://") {
            return Err(crate::Error::InvalidArgument(
                "STARTTLS cannot be combined with an ldaps:// URL".into(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(crate::Error::InvalidArgument(
                "timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Anonymous bind when no service account is configured
    pub fn is_anonymous(&self) -> bool {
        self.bind_dn.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> crate::Result<()> {
        match self.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(crate::Error::InvalidArgument(format!(
                "Unknown log format: {}",
                other
            ))),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}
