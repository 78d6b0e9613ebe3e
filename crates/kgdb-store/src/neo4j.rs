//! Neo4j adapter: Bolt protocol via `neo4rs`, Cypher dialect.

use async_trait::async_trait;
use kgdb_types::{
    record_from_value, ConnectOptions, GraphDatabase, GraphDbError, NativeAccess, QueryParams,
    Record,
};
use neo4rs::{
    query, BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    Graph, Txn,
};

/// Uniqueness constraints and property indices the application queries rely
/// on. Every statement is re-runnable (`IF NOT EXISTS`), so provisioning is
/// idempotent.
const SCHEMA_STATEMENTS: [&str; 10] = [
    "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Episode) REQUIRE n.id IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Message) REQUIRE n.id IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Entity) REQUIRE n.id IS UNIQUE",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Message) REQUIRE n.timestamp IS NOT NULL",
    "CREATE CONSTRAINT IF NOT EXISTS FOR (n:Episode) REQUIRE n.created_at IS NOT NULL",
    "CREATE INDEX IF NOT EXISTS FOR (n:Episode) ON (n.created_at)",
    "CREATE INDEX IF NOT EXISTS FOR (n:Message) ON (n.timestamp)",
    "CREATE INDEX IF NOT EXISTS FOR (n:Message) ON (n.role)",
    "CREATE INDEX IF NOT EXISTS FOR (n:Entity) ON (n.type)",
    "CREATE INDEX IF NOT EXISTS FOR (n:Entity) ON (n.name)",
];

/// One global schema reset; drops every constraint and index.
const SCHEMA_RESET_STATEMENT: &str = "CALL apoc.schema.assert({}, {}, true)";

const CLEAR_STATEMENT: &str = "MATCH (n) DETACH DELETE n";

/// Neo4j implementation of [`GraphDatabase`].
///
/// Holds one pooled [`Graph`]; disconnected until [`connect`] succeeds.
///
/// [`connect`]: GraphDatabase::connect
pub struct Neo4jDatabase {
    driver: Option<Graph>,
}

impl Neo4jDatabase {
    pub fn new() -> Self {
        Self { driver: None }
    }

    fn graph(&self) -> Result<&Graph, GraphDbError> {
        self.driver
            .as_ref()
            .ok_or_else(|| GraphDbError::Connection("not connected to Neo4j".to_string()))
    }
}

impl Default for Neo4jDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphDatabase for Neo4jDatabase {
    async fn connect(&mut self, options: ConnectOptions) -> Result<(), GraphDbError> {
        if self.driver.is_some() {
            return Err(GraphDbError::Connection(
                "already connected to Neo4j; close before reconnecting".to_string(),
            ));
        }

        tracing::debug!("connecting to Neo4j at {}", options.uri);
        let graph = Graph::new(
            options.uri.as_str(),
            options.user.as_str(),
            options.password.as_str(),
        )
        .await
            .map_err(|e| {
                GraphDbError::Connection(format!(
                    "failed to connect to Neo4j at {}: {e}",
                    options.uri
                ))
            })?;

        // Probe the connection; Graph::new alone does not hit the server.
        graph.run(query("RETURN 1")).await.map_err(|e| {
            GraphDbError::Connection(format!("failed to connect to Neo4j at {}: {e}", options.uri))
        })?;

        tracing::info!("connected to Neo4j at {}", options.uri);
        self.driver = Some(graph);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), GraphDbError> {
        // neo4rs has no explicit shutdown; dropping the Graph releases the pool.
        if self.driver.take().is_some() {
            tracing::debug!("closed Neo4j connection");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    async fn execute_query(
        &self,
        statement: &str,
        parameters: QueryParams,
    ) -> Result<Vec<Record>, GraphDbError> {
        let graph = self.graph()?;

        let mut q = query(statement);
        for (name, value) in &parameters {
            q = q.param(name, bolt_value(value));
        }

        let mut rows = graph
            .execute(q)
            .await
            .map_err(|e| GraphDbError::query(statement, e))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| GraphDbError::query(statement, e))?
        {
            let value: serde_json::Value =
                row.to().map_err(|e| GraphDbError::query(statement, e))?;
            records.push(record_from_value(value));
        }
        Ok(records)
    }

    async fn build_indices(&self, delete_existing: bool) -> Result<(), GraphDbError> {
        let graph = self.graph()?;

        if delete_existing {
            tracing::debug!("dropping existing Neo4j constraints and indices");
            run_statement(graph, SCHEMA_RESET_STATEMENT).await?;
        }

        for statement in SCHEMA_STATEMENTS {
            run_statement(graph, statement).await?;
        }
        tracing::info!(
            "provisioned {} Neo4j constraints and indices",
            SCHEMA_STATEMENTS.len()
        );
        Ok(())
    }

    async fn clear_all_data(&self) -> Result<(), GraphDbError> {
        let graph = self.graph()?;
        run_statement(graph, CLEAR_STATEMENT).await?;
        tracing::info!("cleared all Neo4j data");
        Ok(())
    }
}

#[async_trait]
impl NativeAccess for Neo4jDatabase {
    type Driver = Graph;
    type Session = Txn;

    fn driver(&self) -> Result<&Graph, GraphDbError> {
        self.graph()
    }

    /// A fresh transaction on a pooled connection, one per call.
    async fn session(&self) -> Result<Txn, GraphDbError> {
        let graph = self.graph()?;
        graph.start_txn().await.map_err(|e| {
            GraphDbError::Connection(format!("failed to open Neo4j transaction: {e}"))
        })
    }
}

async fn run_statement(graph: &Graph, statement: &str) -> Result<(), GraphDbError> {
    graph
        .run(query(statement))
        .await
        .map_err(|e| GraphDbError::query(statement, e))
}

/// Map a JSON parameter value onto the Bolt type system.
fn bolt_value(value: &serde_json::Value) -> BoltType {
    match value {
        serde_json::Value::Null => BoltType::Null(BoltNull),
        serde_json::Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => BoltType::Integer(BoltInteger::new(i)),
            None => BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(0.0))),
        },
        serde_json::Value::String(s) => BoltType::String(BoltString::new(s)),
        serde_json::Value::Array(items) => BoltType::List(BoltList {
            value: items.iter().map(bolt_value).collect(),
        }),
        serde_json::Value::Object(fields) => BoltType::Map(BoltMap {
            value: fields
                .iter()
                .map(|(k, v)| (BoltString::new(k), bolt_value(v)))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn operations_fail_fast_while_disconnected() {
        let db = Neo4jDatabase::new();
        assert!(!db.is_connected());

        let err = db.execute_query("RETURN 1", QueryParams::new()).await.unwrap_err();
        assert!(matches!(err, GraphDbError::Connection(_)));

        assert!(matches!(
            db.build_indices(false).await.unwrap_err(),
            GraphDbError::Connection(_)
        ));
        assert!(matches!(
            db.clear_all_data().await.unwrap_err(),
            GraphDbError::Connection(_)
        ));
        assert!(matches!(db.driver(), Err(GraphDbError::Connection(_))));
        assert!(matches!(
            db.session().await,
            Err(GraphDbError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn close_is_a_no_op_while_disconnected() {
        let mut db = Neo4jDatabase::new();
        db.close().await.unwrap();
        db.close().await.unwrap();
    }

    #[test]
    fn scalar_parameters_map_onto_bolt_types() {
        assert_eq!(bolt_value(&json!(null)), BoltType::Null(BoltNull));
        assert_eq!(bolt_value(&json!(true)), BoltType::Boolean(BoltBoolean::new(true)));
        assert_eq!(bolt_value(&json!(42)), BoltType::Integer(BoltInteger::new(42)));
        assert_eq!(bolt_value(&json!(1.5)), BoltType::Float(BoltFloat::new(1.5)));
        assert_eq!(
            bolt_value(&json!("episode-1")),
            BoltType::String(BoltString::new("episode-1"))
        );
    }

    #[test]
    fn structured_parameters_map_recursively() {
        let list = bolt_value(&json!([1, "two"]));
        match list {
            BoltType::List(items) => assert_eq!(items.value.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }

        let map = bolt_value(&json!({"role": "user", "turn": 3}));
        match map {
            BoltType::Map(fields) => assert_eq!(fields.value.len(), 2),
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn schema_statements_are_idempotent() {
        for statement in SCHEMA_STATEMENTS {
            assert!(statement.contains("IF NOT EXISTS"), "not re-runnable: {statement}");
        }
    }
}
