//! Data models for the pgscope core.
//!
//! - `connection` - ConnectionConfig, SslMode, SessionState
//! - `result_set` - ResultSet cursor over tabular results
//! - `dependency` - ObjectKind, DependencyClass, DependencyRow
//! - `settings` - BrowserSettings

pub mod connection;
pub mod dependency;
pub mod result_set;
pub mod settings;

pub use connection::{ConnectionConfig, ConnectionOptions, SessionState, SslMode};
pub use dependency::{DependencyClass, DependencyRow, Discriminator, ObjectKind};
pub use result_set::{str_to_bool, ResultSet};
pub use settings::BrowserSettings;
