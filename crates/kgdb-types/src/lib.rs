//! Core types and the backend contract for the EKG graph store layer.
//!
//! The application talks to interchangeable graph databases (Neo4j over Bolt,
//! SurrealDB over WebSocket) through the [`GraphDatabase`] trait; everything
//! backend-specific lives behind it.

mod options;
mod traits;

pub use options::{ConnectOptions, DatabaseType};
pub use traits::{
    record_from_value, GraphDatabase, GraphDbError, NativeAccess, QueryParams, Record,
};
