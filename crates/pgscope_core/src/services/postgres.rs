//! PostgreSQL backend over tokio-postgres.
//!
//! Queries go through the simple-query protocol so every value comes back
//! as text. Each backend owns a current-thread tokio runtime and blocks on
//! it; the connection task runs on the same runtime and forwards server
//! notices to a [`NoticeSink`].

use std::net::IpAddr;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_postgres::{AsyncMessage, Client, NoTls, SimpleQueryMessage};
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::models::ConnectionConfig;
use crate::services::backend::{Backend, NoticeSink, QueryResponse};

/// A single blocking PostgreSQL connection.
pub struct PgBackend {
    client: Client,
    cancel: CancellationToken,
    runtime: tokio::runtime::Runtime,
}

impl PgBackend {
    /// Connect to the server at an already resolved address.
    pub fn connect(
        config: &ConnectionConfig,
        hostaddr: IpAddr,
        password: &str,
        notices: NoticeSink,
    ) -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::internal(format!("Failed to create tokio runtime: {e}")))?;

        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&config.host);
        pg_config.hostaddr(hostaddr);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.username);
        if !password.is_empty() {
            pg_config.password(password);
        }
        pg_config.application_name(&config.options.application_name);
        pg_config.connect_timeout(Duration::from_secs(config.options.connect_timeout_secs as u64));
        pg_config.ssl_mode(config.ssl_mode.to_driver());

        tracing::info!(
            host = %config.host,
            hostaddr = %hostaddr,
            port = config.port,
            database = %config.database,
            user = %config.username,
            ssl_mode = config.ssl_mode.as_str(),
            "Opening connection"
        );

        let (client, mut connection) = runtime.block_on(pg_config.connect(NoTls))?;

        runtime.spawn(async move {
            let mut messages =
                futures_util::stream::poll_fn(move |cx| connection.poll_message(cx));
            while let Some(message) = messages.next().await {
                match message {
                    Ok(AsyncMessage::Notice(notice)) => notices.notice(notice.message()),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Database connection error");
                        break;
                    }
                }
            }
        });

        Ok(Self { client, cancel: CancellationToken::new(), runtime })
    }
}

impl Backend for PgBackend {
    fn execute(&mut self, sql: &str) -> Result<QueryResponse, Error> {
        let client = &self.client;
        let cancel = self.cancel.clone();

        let result = self.runtime.block_on(async {
            tokio::select! {
                messages = client.simple_query(sql) => messages.map_err(Error::from),
                _ = cancel.cancelled() => {
                    if let Err(e) = client.cancel_token().cancel_query(NoTls).await {
                        tracing::warn!(error = %e, "Failed to send cancel request");
                    }
                    Err(Error::QueryCancelled)
                }
            }
        });

        // A fired token stays fired; hand out a fresh one for the next query.
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }

        result.map(collect_response)
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Keep the result of the last statement, as libpq's `PQexec` does.
fn collect_response(messages: Vec<SimpleQueryMessage>) -> QueryResponse {
    let mut response = QueryResponse::Command { rows_affected: 0 };
    let mut columns: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Option<String>>> = Vec::new();

    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(description) => {
                columns = Some(description.iter().map(|c| c.name().to_string()).collect());
                rows.clear();
            }
            SimpleQueryMessage::Row(row) => {
                if columns.is_none() {
                    columns = Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                rows.push((0..row.len()).map(|i| row.get(i).map(String::from)).collect());
            }
            SimpleQueryMessage::CommandComplete(rows_affected) => {
                response = match columns.take() {
                    Some(columns) => {
                        QueryResponse::Rows { columns, rows: std::mem::take(&mut rows) }
                    }
                    None => QueryResponse::Command { rows_affected },
                };
            }
            _ => {}
        }
    }

    response
}
