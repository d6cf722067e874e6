//! Connection configuration and session state models.

use serde::{Deserialize, Serialize};

/// Current state of a [`Session`](crate::services::Session).
///
/// `Bad` is the initial state. `DnsError` and `Bad` are terminal until the
/// caller opens a new session; `Broken` is entered from `Ok` when the
/// liveness probe fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No usable connection
    #[default]
    Bad,
    /// The hostname could not be resolved
    DnsError,
    /// Connected and usable
    Ok,
    /// Was connected; the liveness probe failed and the connection was released
    Broken,
}

impl SessionState {
    /// Check if the session can execute queries.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Whether a presentation layer should report the connection as broken.
    pub fn is_broken_or_bad(&self) -> bool {
        matches!(self, Self::Broken | Self::Bad)
    }
}

/// SSL mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// No SSL
    Disable,
    /// Try plain first, SSL if the server insists
    Allow,
    /// Use SSL if available (default)
    #[default]
    Prefer,
    /// Require SSL. Sessions connect without a TLS connector, so servers
    /// reject this mode until one is configured.
    Require,
}

impl SslMode {
    /// Convert to string representation for storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Allow => "allow",
            Self::Prefer => "prefer",
            Self::Require => "require",
        }
    }

    /// Parse from string representation.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "disable" => Self::Disable,
            "allow" => Self::Allow,
            "require" => Self::Require,
            _ => Self::Prefer,
        }
    }

    /// Map onto the driver's SSL modes. The driver has no `allow`; it
    /// behaves like `prefer` for a plain-text transport.
    pub(crate) fn to_driver(self) -> tokio_postgres::config::SslMode {
        match self {
            Self::Disable => tokio_postgres::config::SslMode::Disable,
            Self::Allow | Self::Prefer => tokio_postgres::config::SslMode::Prefer,
            Self::Require => tokio_postgres::config::SslMode::Require,
        }
    }
}

/// Additional connection options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Connection timeout in seconds
    pub connect_timeout_secs: u32,
    /// Application name sent to PostgreSQL
    pub application_name: String,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self { connect_timeout_secs: 10, application_name: "pgscope".to_string() }
    }
}

/// Configuration for a database session.
///
/// Passwords are supplied when the session is opened and never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Display name
    pub name: String,
    /// Server hostname or IP
    pub host: String,
    /// Server port (default 5432)
    pub port: u16,
    /// Database name
    pub database: String,
    /// Login username
    pub username: String,
    /// SSL configuration
    #[serde(default)]
    pub ssl_mode: SslMode,
    /// Additional options
    #[serde(default)]
    pub options: ConnectionOptions,
}

impl ConnectionConfig {
    /// Create a new connection configuration with required fields.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: 5432,
            database: database.into(),
            username: username.into(),
            ssl_mode: SslMode::default(),
            options: ConnectionOptions::default(),
        }
    }

    /// Create a builder for complex configurations.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.len() > 255 {
            return Err("Name must be 1-255 characters".to_string());
        }
        if self.host.is_empty() {
            return Err("Host is required".to_string());
        }
        if self.database.is_empty() || self.database.len() > 63 {
            return Err("Database name must be 1-63 characters".to_string());
        }
        if self.username.is_empty() {
            return Err("Username is required".to_string());
        }
        Ok(())
    }

    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        format!("postgresql://{}@{}:{}/{}", self.username, self.host, self.port, self.database)
    }
}

/// Builder for ConnectionConfig.
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    name: Option<String>,
    host: Option<String>,
    port: u16,
    database: Option<String>,
    username: Option<String>,
    ssl_mode: SslMode,
    options: ConnectionOptions,
}

impl ConnectionConfigBuilder {
    /// Set the connection name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the SSL mode.
    pub fn ssl_mode(mut self, ssl_mode: SslMode) -> Self {
        self.ssl_mode = ssl_mode;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout_secs(mut self, secs: u32) -> Self {
        self.options.connect_timeout_secs = secs;
        self
    }

    /// Set the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.options.application_name = name.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<ConnectionConfig, String> {
        let config = ConnectionConfig {
            name: self.name.ok_or("Name is required")?,
            host: self.host.ok_or("Host is required")?,
            port: if self.port == 0 { 5432 } else { self.port },
            database: self.database.ok_or("Database is required")?,
            username: self.username.ok_or("Username is required")?,
            ssl_mode: self.ssl_mode,
            options: self.options,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_port_and_validates() {
        let config = ConnectionConfig::builder()
            .name("local")
            .host("localhost")
            .database("postgres")
            .username("postgres")
            .build()
            .unwrap();
        assert_eq!(config.port, 5432);
        assert_eq!(config.display_url(), "postgresql://postgres@localhost:5432/postgres");

        let missing = ConnectionConfig::builder().name("x").host("h").username("u").build();
        assert_eq!(missing.unwrap_err(), "Database is required");
    }

    #[test]
    fn test_validate_rejects_long_database_name() {
        let config = ConnectionConfig::new("n", "h", "d".repeat(64), "u");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ssl_mode_parse() {
        assert_eq!(SslMode::parse("ALLOW"), SslMode::Allow);
        assert_eq!(SslMode::parse("require"), SslMode::Require);
        assert_eq!(SslMode::parse("bogus"), SslMode::Prefer);
        assert_eq!(SslMode::Disable.as_str(), "disable");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ConnectionConfig = serde_json::from_str(
            r#"{"name":"n","host":"db","port":5433,"database":"app","username":"me"}"#,
        )
        .unwrap();
        assert_eq!(config.ssl_mode, SslMode::Prefer);
        assert_eq!(config.options.connect_timeout_secs, 10);
        assert_eq!(config.port, 5433);
    }

    #[test]
    fn test_session_state_predicates() {
        assert!(SessionState::default().is_broken_or_bad());
        assert!(SessionState::Broken.is_broken_or_bad());
        assert!(!SessionState::DnsError.is_broken_or_bad());
        assert!(SessionState::Ok.is_ok());
    }
}
