//! Database sessions: connection state, liveness, and the query surface.
//!
//! A [`Session`] exclusively owns one connection. Every call blocks until
//! the server answers. Query failures never surface as errors: they are
//! logged and coded as `false` / `None`, and each one triggers a liveness
//! probe that may move the session to [`SessionState::Broken`].

use std::net::{IpAddr, ToSocketAddrs};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::models::{str_to_bool, ConnectionConfig, ResultSet, SessionState};
use crate::services::backend::{Backend, NoticeSink, QueryResponse};
use crate::services::postgres::PgBackend;
use crate::sql::quote_literal;

/// Tracing target for executed SQL text.
pub const SQL_LOG_TARGET: &str = "pgscope::sql";

const PROBE_SQL: &str = "SELECT 1;";

/// Last system OID assumed when the server no longer reports
/// `datlastsysoid` (one below the first normal object id).
const DEFAULT_LAST_SYSTEM_OID: u32 = 16383;

/// An open, stateful handle to a database server.
pub struct Session {
    config: ConnectionConfig,
    backend: Option<Box<dyn Backend>>,
    state: SessionState,
    host_ip: Option<IpAddr>,
    encoding: String,
    last_system_oid: u32,
    needs_column_quoting: bool,
    server_version: Option<(u32, u32)>,
    connected_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    notices: NoticeSink,
}

impl Session {
    fn unconnected(config: ConnectionConfig) -> Self {
        Self {
            config,
            backend: None,
            state: SessionState::Bad,
            host_ip: None,
            encoding: String::new(),
            last_system_oid: DEFAULT_LAST_SYSTEM_OID,
            needs_column_quoting: false,
            server_version: None,
            connected_at: None,
            last_error: None,
            notices: NoticeSink::default(),
        }
    }

    /// Resolve the host, connect, and read the database's encoding and
    /// last system OID.
    ///
    /// Never fails: check [`status`](Self::status) and
    /// [`last_error`](Self::last_error) afterwards.
    pub fn open(config: ConnectionConfig, password: &str) -> Self {
        let mut session = Self::unconnected(config);
        if let Err(message) = session.config.validate() {
            tracing::error!(
                name = %session.config.name,
                error = %message,
                "Invalid connection settings"
            );
            session.last_error = Some(message);
            return session;
        }

        let hostaddr = match resolve_host(&session.config.host, session.config.port) {
            Ok(ip) => ip,
            Err(e) => {
                tracing::error!(host = %session.config.host, error = %e, "Host resolution failed");
                session.state = SessionState::DnsError;
                session.last_error = Some(e.to_string());
                return session;
            }
        };
        tracing::info!(
            host = %session.config.host,
            resolved = %hostaddr,
            "Server name resolved"
        );
        session.host_ip = Some(hostaddr);

        match PgBackend::connect(&session.config, hostaddr, password, session.notices.clone()) {
            Ok(backend) => session.attach(Box::new(backend)),
            Err(e) => {
                tracing::error!(
                    url = %session.config.display_url(),
                    error = %e,
                    "Connection failed"
                );
                session.last_error = Some(e.to_string());
            }
        }
        session
    }

    /// Build a session on an already connected backend.
    pub fn with_backend(config: ConnectionConfig, backend: Box<dyn Backend>) -> Self {
        let mut session = Self::unconnected(config);
        session.attach(backend);
        session
    }

    fn attach(&mut self, backend: Box<dyn Backend>) {
        self.backend = Some(backend);
        self.state = SessionState::Ok;
        self.connected_at = Some(Utc::now());
        self.load_database_info();
    }

    fn load_database_info(&mut self) {
        let sql = format!(
            "SELECT pg_encoding_to_char(encoding) AS encoding, \
             (to_jsonb(d) ->> 'datlastsysoid') AS datlastsysoid\n  \
             FROM pg_database d WHERE datname={}",
            quote_literal(&self.config.database)
        );
        let Some(set) = self.execute_set(&sql) else {
            return;
        };

        self.needs_column_quoting = set.column_number("\"datlastsysoid\"").is_some();
        let set = set.with_column_quoting(self.needs_column_quoting);
        if !set.is_null("datlastsysoid") {
            self.last_system_oid = set.oid("datlastsysoid");
        }
        self.encoding = set.value("encoding").to_string();

        tracing::info!(
            database = %self.config.database,
            encoding = %self.encoding,
            last_system_oid = self.last_system_oid,
            needs_column_quoting = self.needs_column_quoting,
            "Session established"
        );
    }

    /// Release the connection. The session stays `Bad` until reopened.
    pub fn close(&mut self) {
        self.last_error = None;
        if self.backend.take().is_some() {
            tracing::info!(
                host = %self.config.host,
                database = %self.config.database,
                "Session closed"
            );
        }
        self.state = SessionState::Bad;
    }

    /// Current state. A connection that dropped on its own reads as `Bad`.
    pub fn status(&self) -> SessionState {
        match &self.backend {
            Some(backend) if self.state == SessionState::Ok && backend.is_closed() => {
                SessionState::Bad
            }
            _ => self.state,
        }
    }

    // ========== Query surface ==========

    /// Execute a statement for its status only.
    ///
    /// Returns `true` iff the server reported success.
    pub fn execute_void(&mut self, sql: &str) -> bool {
        if !self.status().is_ok() {
            return false;
        }
        match self.run("Void", sql) {
            Ok(_) => true,
            Err(e) => {
                self.report(e);
                false
            }
        }
    }

    /// Execute a query and return the first column of its first row.
    ///
    /// `None` covers zero rows, a NULL value and failure alike; callers that
    /// must tell them apart check [`status`](Self::status) and
    /// [`last_error`](Self::last_error).
    pub fn execute_scalar(&mut self, sql: &str) -> Option<String> {
        if !self.status().is_ok() {
            return None;
        }
        match self.run("Scalar", sql).and_then(first_value) {
            Ok(value) => {
                tracing::debug!(target: SQL_LOG_TARGET, result = ?value, "Query result");
                value
            }
            Err(Error::NoRows) => {
                tracing::info!("Query returned no tuples");
                None
            }
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    /// Execute a query and return its rows.
    ///
    /// A statement without tuples yields an empty set; failure yields `None`.
    pub fn execute_set(&mut self, sql: &str) -> Option<ResultSet> {
        if !self.status().is_ok() {
            return None;
        }
        match self.run("Set", sql) {
            Ok(QueryResponse::Rows { columns, rows }) => {
                Some(ResultSet::new(columns, rows).with_column_quoting(self.needs_column_quoting))
            }
            Ok(QueryResponse::Command { .. }) => Some(ResultSet::default()),
            Err(e) => {
                self.report(e);
                None
            }
        }
    }

    /// Probe the server with a trivial query.
    ///
    /// On failure the connection is released and the session becomes
    /// `Broken`; that side effect is the point of calling this.
    pub fn is_alive(&mut self) -> bool {
        if !self.status().is_ok() {
            return false;
        }
        let Some(backend) = self.backend.as_mut() else {
            return false;
        };

        match backend.execute(PROBE_SQL) {
            Ok(QueryResponse::Rows { .. }) => true,
            outcome => {
                if let Err(e) = outcome {
                    self.last_error = Some(e.to_string());
                }
                tracing::warn!(
                    host = %self.config.host,
                    database = %self.config.database,
                    "Liveness probe failed, releasing connection"
                );
                self.backend = None;
                self.state = SessionState::Broken;
                false
            }
        }
    }

    /// Text of the last failure, or why there is no connection.
    ///
    /// A session whose connection attempt failed reports the engine's
    /// reason.
    pub fn last_error(&self) -> String {
        if self.backend.is_some() {
            return self.last_error.clone().unwrap_or_default();
        }
        match (self.state, &self.last_error) {
            (SessionState::Broken, _) => Error::ConnectionBroken.to_string(),
            (SessionState::Bad, Some(reason)) => reason.clone(),
            _ => Error::NotConnected.to_string(),
        }
    }

    fn run(&mut self, kind: &'static str, sql: &str) -> Result<QueryResponse, Error> {
        let backend = self.backend.as_mut().ok_or(Error::NotConnected)?;
        tracing::debug!(
            target: SQL_LOG_TARGET,
            kind,
            host = %self.config.host,
            port = self.config.port,
            sql,
            "Executing query"
        );
        backend.execute(sql)
    }

    fn report(&mut self, err: Error) {
        tracing::error!(
            host = %self.config.host,
            category = err.category(),
            code = err.pg_code().unwrap_or_default(),
            error = %err,
            "Query failed"
        );
        self.last_error = Some(err.to_string());
        self.is_alive();
    }

    // ========== Server facts ==========

    /// `SELECT version()`.
    pub fn version_string(&mut self) -> Option<String> {
        self.execute_scalar("SELECT version();")
    }

    /// Whether the server is at least `major.minor`. The version is read
    /// once and cached.
    pub fn backend_minimum_version(&mut self, major: u32, minor: u32) -> bool {
        if self.server_version.is_none() {
            self.server_version = self.version_string().as_deref().and_then(parse_server_version);
        }
        self.server_version
            .is_some_and(|(ma, mi)| ma > major || (ma == major && mi >= minor))
    }

    /// `has_<type>_privilege(object, privilege)` for the session user.
    pub fn has_privilege(&mut self, object_type: &str, object: &str, privilege: &str) -> bool {
        let sql = format!(
            "SELECT has_{}_privilege({}, {})",
            object_type.to_lowercase(),
            quote_literal(object),
            quote_literal(privilege)
        );
        self.execute_scalar(&sql).is_some_and(|v| str_to_bool(&v))
    }

    /// SQL predicate excluding system namespaces, for a namespace-name column.
    pub fn system_namespace_restriction(column: &str) -> String {
        format!("({column} NOT LIKE 'pg\\_%' AND {column} NOT LIKE 'information_schema')")
    }

    /// Whether an object id belongs to the system catalog.
    pub fn is_system_oid(&self, oid: u32) -> bool {
        oid < self.last_system_oid
    }

    // ========== Accessors ==========

    /// Token that cancels the statement in flight; `None` without a
    /// connection. A token is good for one cancellation.
    pub fn cancel_token(&self) -> Option<CancellationToken> {
        self.backend.as_ref().map(|b| b.cancel_token())
    }

    /// Forward server notices to `handler` as well as to the log.
    pub fn set_notice_handler(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        self.notices.set_handler(handler);
    }

    /// Get the connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn host(&self) -> &str {
        &self.config.host
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Address the host name resolved to.
    pub fn host_ip(&self) -> Option<IpAddr> {
        self.host_ip
    }

    /// Server-side encoding of the database.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn last_system_oid(&self) -> u32 {
        self.last_system_oid
    }

    pub fn needs_column_quoting(&self) -> bool {
        self.needs_column_quoting
    }

    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.connected_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("database", &self.config.database)
            .field("state", &self.state)
            .field("encoding", &self.encoding)
            .field("last_system_oid", &self.last_system_oid)
            .finish()
    }
}

fn first_value(response: QueryResponse) -> Result<Option<String>, Error> {
    match response {
        QueryResponse::Rows { rows, .. } => {
            let row = rows.into_iter().next().ok_or(Error::NoRows)?;
            Ok(row.into_iter().next().flatten())
        }
        QueryResponse::Command { .. } => Err(Error::query_failed("Query did not return tuples")),
    }
}

/// Resolve a host name (or parse an address literal) to an IP address.
pub fn resolve_host(host: &str, port: u16) -> Result<IpAddr, Error> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    (host, port)
        .to_socket_addrs()
        .map_err(|e| Error::unresolvable_with_source(host, e))?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| Error::unresolvable(host))
}

/// Parse `major.minor` from a `version()` string such as
/// `PostgreSQL 16.2 on x86_64-pc-linux-gnu, ...`.
pub fn parse_server_version(version: &str) -> Option<(u32, u32)> {
    fn leading_number(s: &str) -> Option<u32> {
        let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        s[..end].parse().ok()
    }

    let number = version.split_whitespace().nth(1)?;
    let mut parts = number.split('.');
    let major = leading_number(parts.next()?)?;
    let minor = parts.next().and_then(leading_number).unwrap_or(0);
    Some((major, minor))
}
