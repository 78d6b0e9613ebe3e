//! Backend-selected construction of graph database adapters.

use kgdb_types::{DatabaseType, GraphDatabase, GraphDbError};

/// Construct a disconnected adapter for the selected backend.
///
/// Stateless: every call returns a fresh instance, so callers needing several
/// connections of the same backend just call again (or use the concrete
/// constructors, [`Neo4jDatabase::new`] / [`SurrealDatabase::new`], when they
/// want the typed handle accessors).
///
/// A selector whose backend was compiled out fails with
/// [`GraphDbError::Configuration`]; adding a backend means one new
/// [`DatabaseType`] variant, one adapter, and one match arm here.
///
/// [`Neo4jDatabase::new`]: crate::Neo4jDatabase::new
/// [`SurrealDatabase::new`]: crate::SurrealDatabase::new
pub fn create_database(db_type: DatabaseType) -> Result<Box<dyn GraphDatabase>, GraphDbError> {
    match db_type {
        #[cfg(feature = "neo4j")]
        DatabaseType::Neo4j => Ok(Box::new(crate::Neo4jDatabase::new())),
        #[cfg(feature = "surrealdb")]
        DatabaseType::SurrealDb => Ok(Box::new(crate::SurrealDatabase::new())),
        #[allow(unreachable_patterns)]
        other => Err(GraphDbError::Configuration(format!(
            "backend {other} is not compiled into this build"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgdb_types::QueryParams;
    use std::str::FromStr;

    #[tokio::test]
    async fn factory_returns_disconnected_adapters() {
        for ty in [DatabaseType::Neo4j, DatabaseType::SurrealDb] {
            let db = create_database(ty).unwrap();
            assert!(!db.is_connected(), "{ty} adapter started connected");

            // Querying before connect fails fast, no implicit reconnect.
            let err = db
                .execute_query("RETURN 1", QueryParams::new())
                .await
                .unwrap_err();
            assert!(matches!(err, GraphDbError::Connection(_)));
        }
    }

    #[tokio::test]
    async fn boxed_adapters_close_repeatedly() {
        let mut db = create_database(DatabaseType::SurrealDb).unwrap();
        db.close().await.unwrap();
        db.close().await.unwrap();
    }

    #[test]
    fn unknown_selector_strings_construct_nothing() {
        let err = DatabaseType::from_str("dgraph").unwrap_err();
        assert!(matches!(err, GraphDbError::Configuration(_)));
    }
}
