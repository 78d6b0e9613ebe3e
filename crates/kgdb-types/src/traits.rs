//! The graph database contract and its error taxonomy.

use crate::ConnectOptions;
use async_trait::async_trait;
use std::collections::HashMap;

/// Named parameters for one statement, in the backend's native dialect.
pub type QueryParams = HashMap<String, serde_json::Value>;

/// One returned row, as a generic field-name -> value map.
///
/// Field names and value shapes are whatever the backend returns, unconverted.
pub type Record = HashMap<String, serde_json::Value>;

/// Fold a backend row into a [`Record`]. Non-object rows (a bare scalar from
/// e.g. `RETURN 1`) land under a single `"value"` field.
pub fn record_from_value(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(fields) => fields.into_iter().collect(),
        other => HashMap::from([("value".to_string(), other)]),
    }
}

/// Capability set every graph store backend must implement.
///
/// An adapter is constructed disconnected, becomes usable after a successful
/// [`connect`], and returns to disconnected after [`close`]. Every other
/// operation fails fast with [`GraphDbError::Connection`] while disconnected;
/// there is no implicit reconnect.
///
/// Statements are passed through in the backend's own dialect (Cypher for
/// Neo4j, SurrealQL for SurrealDB); no translation happens at this layer.
///
/// [`connect`]: GraphDatabase::connect
/// [`close`]: GraphDatabase::close
#[async_trait]
pub trait GraphDatabase: Send + Sync {
    /// Establish the underlying connection/session.
    ///
    /// Fails with [`GraphDbError::Connection`] if the endpoint is unreachable,
    /// authentication fails, or this instance is already connected (callers
    /// must `close` before reconnecting).
    async fn connect(&mut self, options: ConnectOptions) -> Result<(), GraphDbError>;

    /// Release the connection. Ok and a no-op when already disconnected.
    async fn close(&mut self) -> Result<(), GraphDbError>;

    /// Whether this instance currently holds a live driver handle.
    fn is_connected(&self) -> bool;

    /// Run one statement and return its rows as generic records.
    ///
    /// May mutate backend state if the statement is a write. Execution
    /// failures surface as [`GraphDbError::Query`] with the backend's
    /// original message preserved.
    async fn execute_query(
        &self,
        statement: &str,
        parameters: QueryParams,
    ) -> Result<Vec<Record>, GraphDbError>;

    /// Provision the schema and indices the application relies on.
    ///
    /// With `delete_existing`, existing schema objects are dropped first.
    /// Not transactional: the first failing statement stops the run and is
    /// named in the returned error, leaving the schema partially applied.
    async fn build_indices(&self, delete_existing: bool) -> Result<(), GraphDbError>;

    /// Remove every stored record without dropping the schema. Destructive;
    /// any confirmation step is the caller's responsibility.
    async fn clear_all_data(&self) -> Result<(), GraphDbError>;
}

/// Typed access to a backend's native driver and session objects.
///
/// The escape hatch for callers that already know which backend they hold,
/// e.g. to run native transactions. What a "session" is stays backend-defined:
/// a per-call pooled transaction for Neo4j, the shared client handle for
/// SurrealDB.
#[async_trait]
pub trait NativeAccess {
    type Driver;
    type Session;

    /// The live driver handle. [`GraphDbError::Connection`] if disconnected.
    fn driver(&self) -> Result<&Self::Driver, GraphDbError>;

    /// A working context for issuing multiple statements.
    /// [`GraphDbError::Connection`] if disconnected.
    async fn session(&self) -> Result<Self::Session, GraphDbError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GraphDbError {
    /// Unknown or unavailable backend selector.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Unreachable endpoint, failed authentication, or an operation attempted
    /// while disconnected.
    #[error("connection error: {0}")]
    Connection(String),
    /// Native execution failure, with the failing statement and the backend's
    /// own message kept for diagnostics.
    #[error("query failed ({statement}): {message}")]
    Query { statement: String, message: String },
}

impl GraphDbError {
    /// Shorthand used by adapters when wrapping a native execution failure.
    pub fn query(statement: impl Into<String>, message: impl ToString) -> Self {
        GraphDbError::Query {
            statement: statement.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_names_the_failing_statement() {
        let err = GraphDbError::query("DEFINE TABLE Episode SCHEMAFULL", "parse error at line 1");
        let text = err.to_string();
        assert!(text.contains("DEFINE TABLE Episode SCHEMAFULL"));
        assert!(text.contains("parse error at line 1"));
    }
}
