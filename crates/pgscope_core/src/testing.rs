//! Scripted engine for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Error;
use crate::services::backend::{Backend, QueryResponse};

type Handler = Box<dyn Fn(&str) -> Result<QueryResponse, Error> + Send>;

/// A backend that answers the liveness probe and session bootstrap itself
/// and routes every other statement to a closure.
///
/// A statement issued after the cancel token fired fails with
/// [`Error::QueryCancelled`] and the token is replaced, as the real backend
/// does.
pub struct MockBackend {
    handler: Handler,
    bootstrap: QueryResponse,
    handles: MockHandles,
    cancel: CancellationToken,
}

/// Shared view into a [`MockBackend`] after it moved into a session.
#[derive(Clone, Default)]
pub struct MockHandles {
    statements: Arc<Mutex<Vec<String>>>,
    probe_fails: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MockHandles {
    /// Every statement the backend received, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    /// Make the next liveness probes fail.
    pub fn fail_probe(&self) {
        self.probe_fails.store(true, Ordering::SeqCst);
    }

    /// Simulate the server dropping the connection.
    pub fn close_connection(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl MockBackend {
    pub fn new(
        handler: impl Fn(&str) -> Result<QueryResponse, Error> + Send + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            bootstrap: QueryResponse::rows(
                &["encoding", "datlastsysoid"],
                vec![row(&["UTF8", "12000"])],
            ),
            handles: MockHandles::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the answer to the database-info query.
    pub fn with_bootstrap(mut self, response: QueryResponse) -> Self {
        self.bootstrap = response;
        self
    }

    pub fn handles(&self) -> MockHandles {
        self.handles.clone()
    }
}

impl Backend for MockBackend {
    fn execute(&mut self, sql: &str) -> Result<QueryResponse, Error> {
        self.handles.statements.lock().push(sql.to_string());

        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
            return Err(Error::QueryCancelled);
        }
        if sql == "SELECT 1;" {
            if self.handles.probe_fails.load(Ordering::SeqCst) {
                return Err(Error::connection("server closed the connection unexpectedly"));
            }
            return Ok(QueryResponse::rows(&["?column?"], vec![row(&["1"])]));
        }
        if sql.contains("FROM pg_database d") {
            return Ok(self.bootstrap.clone());
        }
        (self.handler)(sql)
    }

    fn is_closed(&self) -> bool {
        self.handles.closed.load(Ordering::SeqCst)
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// A row of non-NULL text cells.
pub fn row(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}
