//! Persistence layer: collaborator traits and the libSQL backend behind them.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{IdentityProvider, ProfileStore, RequestStore};
