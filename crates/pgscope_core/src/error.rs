//! Error types for the pgscope core.
//!
//! The public query surface of [`Session`](crate::services::Session) never
//! returns these: failures there are boolean/`Option` coded and logged. The
//! engine boundary, session bootstrap and configuration loading use them.

use thiserror::Error;

/// Main error type for pgscope.
#[derive(Debug, Error)]
pub enum Error {
    /// Hostname lookup failed while opening a session.
    #[error("Could not resolve hostname {host}")]
    ConnectionUnresolvable {
        /// The hostname that failed to resolve.
        host: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Establishing or keeping the connection failed.
    #[error("Connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The server reported a non-success status for a statement.
    #[error("{message}")]
    QueryFailed {
        /// PostgreSQL error message.
        message: String,
        /// Additional detail from PostgreSQL.
        detail: Option<String>,
        /// PostgreSQL hint.
        hint: Option<String>,
        /// Position in query (1-indexed).
        position: Option<usize>,
        /// PostgreSQL error code (e.g., "42P01").
        code: Option<String>,
    },

    /// The statement succeeded but produced no tuples.
    #[error("Query returned no tuples")]
    NoRows,

    /// The liveness probe failed and the connection was released.
    #[error("Connection to database broken.")]
    ConnectionBroken,

    /// No connection has been established.
    #[error("No connection to database.")]
    NotConnected,

    /// The running statement was cancelled through the session's token.
    #[error("Query cancelled")]
    QueryCancelled,

    /// Configuration or settings error.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl Error {
    // ========== Constructors ==========

    /// Create an unresolvable-host error.
    pub fn unresolvable(host: impl Into<String>) -> Self {
        Self::ConnectionUnresolvable { host: host.into(), source: None }
    }

    /// Create an unresolvable-host error with source.
    pub fn unresolvable_with_source(
        host: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionUnresolvable { host: host.into(), source: Some(Box::new(source)) }
    }

    /// Create a new connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Create a query failure carrying only the engine's message.
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
            detail: None,
            hint: None,
            position: None,
            code: None,
        }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    // ========== Methods ==========

    /// Check if this error means the session can no longer be used.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::ConnectionBroken)
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConnectionUnresolvable { .. } => "DNS",
            Self::Connection { .. } | Self::ConnectionBroken | Self::NotConnected => "Connection",
            Self::QueryFailed { .. } | Self::NoRows | Self::QueryCancelled => "Query",
            Self::Config { .. } => "Config",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::ConnectionUnresolvable { .. } => Some("Check the server hostname"),
            Self::Connection { .. } => Some("Check that the database server is running"),
            Self::ConnectionBroken => Some("Reconnect to the server"),
            Self::QueryFailed { hint, .. } => hint.as_deref(),
            Self::Internal { .. } => Some("Please report this issue"),
            Self::NoRows | Self::NotConnected | Self::QueryCancelled | Self::Config { .. } => None,
        }
    }

    /// Get PostgreSQL error code (if applicable).
    pub fn pg_code(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

// ========== Error Conversions ==========

impl From<tokio_postgres::Error> for Error {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let message = db_err.message().to_string();
            let code_str = db_err.code().code();

            // Connection exceptions (08xxx)
            if code_str.starts_with("08") {
                return Error::Connection { message, source: Some(Box::new(err)) };
            }

            let position = db_err.position().and_then(|p| match p {
                tokio_postgres::error::ErrorPosition::Original(pos) => Some(*pos as usize),
                tokio_postgres::error::ErrorPosition::Internal { .. } => None,
            });
            return Error::QueryFailed {
                message,
                detail: db_err.detail().map(String::from),
                hint: db_err.hint().map(String::from),
                position,
                code: Some(code_str.to_string()),
            };
        }

        if err.is_closed() {
            return Error::Connection {
                message: "Connection closed".to_string(),
                source: Some(Box::new(err)),
            };
        }

        Error::Connection { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Config { message: err.to_string(), source: Some(Box::new(err)) }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config { message: format!("JSON error: {err}"), source: Some(Box::new(err)) }
    }
}
