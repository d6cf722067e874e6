//! Core of the pgscope PostgreSQL browser.
//!
//! This crate holds everything below the presentation layer:
//!
//! - **error**: Error type for the engine boundary and configuration
//! - **models**: Connection settings, result sets, dependency rows
//! - **services**: Sessions, dependency discovery, DDL and definition formatting
//! - **sql**: Quoting and tokenizing helpers
//! - **state**: Registry of open sessions
//! - **logging**: Structured logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod sql;
pub mod state;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use models::{
    BrowserSettings, ConnectionConfig, ConnectionOptions, DependencyClass, DependencyRow,
    ObjectKind, ResultSet, SessionState, SslMode,
};
pub use services::{DependencyResolver, Session};
pub use state::SessionRegistry;
