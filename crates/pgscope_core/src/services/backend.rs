//! The engine boundary a [`Session`](super::Session) talks through.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// What the server returned for the last statement of a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    /// The statement produced a tuple description (tuples-ok).
    Rows {
        /// Column names in result order.
        columns: Vec<String>,
        /// Text cells; `None` is SQL NULL.
        rows: Vec<Vec<Option<String>>>,
    },
    /// The statement completed without tuples (command-ok).
    Command {
        /// Rows affected as reported by the command tag.
        rows_affected: u64,
    },
}

impl QueryResponse {
    /// Build a tuples result.
    pub fn rows(columns: &[&str], rows: Vec<Vec<Option<String>>>) -> Self {
        Self::Rows { columns: columns.iter().map(|c| c.to_string()).collect(), rows }
    }
}

/// A live connection to a database engine.
///
/// Implementations block until the server answers.
pub trait Backend: Send {
    /// Execute a query string and return the result of its last statement.
    fn execute(&mut self, sql: &str) -> Result<QueryResponse, Error>;

    /// Whether the underlying connection has gone away.
    fn is_closed(&self) -> bool;

    /// Token that cancels the statement currently executing.
    fn cancel_token(&self) -> CancellationToken;
}

type NoticeHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Receives server notices: logs them, then forwards them to a registered
/// handler.
#[derive(Clone, Default)]
pub struct NoticeSink {
    handler: Arc<Mutex<Option<NoticeHandler>>>,
}

impl NoticeSink {
    /// Register the handler, replacing any previous one.
    pub fn set_handler(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        *self.handler.lock() = Some(Box::new(handler));
    }

    /// Remove the handler.
    pub fn clear_handler(&self) {
        *self.handler.lock() = None;
    }

    /// Deliver one notice.
    pub fn notice(&self, message: &str) {
        tracing::info!(notice = %message, "Server notice");
        if let Some(handler) = self.handler.lock().as_ref() {
            handler(message);
        }
    }
}

impl std::fmt::Debug for NoticeSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoticeSink").field("has_handler", &self.handler.lock().is_some()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_sink_forwards_to_handler() {
        let sink = NoticeSink::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        sink.set_handler(move |msg| captured.lock().push(msg.to_string()));

        sink.clone().notice("table \"t\" does not exist, skipping");
        assert_eq!(seen.lock().as_slice(), ["table \"t\" does not exist, skipping"]);

        sink.clear_handler();
        sink.notice("ignored");
        assert_eq!(seen.lock().len(), 1);
    }
}
