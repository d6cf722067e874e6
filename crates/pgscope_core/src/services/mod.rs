//! Service layer for the pgscope core.
//!
//! - `backend` - the engine boundary (`Backend` trait, notice sink)
//! - `postgres` - tokio-postgres backend
//! - `session` - session state machine and query surface
//! - `dependency` - dependency discovery over `pg_depend`
//! - `ddl` - COMMENT, OWNER and GRANT statement generation
//! - `formatter` - re-indentation of stored definitions

pub mod backend;
pub mod ddl;
pub mod dependency;
pub mod formatter;
pub mod postgres;
pub mod session;

pub use backend::{Backend, NoticeSink, QueryResponse};
pub use dependency::{DependencyResolver, Direction};
pub use formatter::{formatted_definition, reformat};
pub use postgres::PgBackend;
pub use session::{parse_server_version, resolve_host, Session, SQL_LOG_TARGET};
