//! SurrealDB adapter: WebSocket protocol via the `surrealdb` crate,
//! SurrealQL dialect.

use async_trait::async_trait;
use kgdb_types::{
    record_from_value, ConnectOptions, GraphDatabase, GraphDbError, NativeAccess, QueryParams,
    Record,
};
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;

const DEFAULT_NAMESPACE: &str = "ekg";
const DEFAULT_DATABASE: &str = "ekg";

/// Every table the application writes to, node tables and edge tables alike.
const TABLES: [&str; 6] = [
    "Episode",
    "Message",
    "Entity",
    "MENTIONS",
    "HAS_MESSAGE",
    "REFERS_TO",
];

/// Schema-full table, field, and index definitions. `DEFINE` statements
/// overwrite on re-application, so the whole list is re-runnable.
const SCHEMA_STATEMENTS: [&str; 26] = [
    "DEFINE TABLE Episode SCHEMAFULL",
    "DEFINE TABLE Message SCHEMAFULL",
    "DEFINE TABLE Entity SCHEMAFULL",
    "DEFINE TABLE MENTIONS SCHEMAFULL",
    "DEFINE TABLE HAS_MESSAGE SCHEMAFULL",
    "DEFINE TABLE REFERS_TO SCHEMAFULL",
    "DEFINE FIELD id ON Episode TYPE string",
    "DEFINE FIELD created_at ON Episode TYPE datetime",
    "DEFINE FIELD title ON Episode TYPE string",
    "DEFINE FIELD summary ON Episode TYPE string",
    "DEFINE FIELD id ON Message TYPE string",
    "DEFINE FIELD timestamp ON Message TYPE datetime",
    "DEFINE FIELD role ON Message TYPE string",
    "DEFINE FIELD content ON Message TYPE string",
    "DEFINE FIELD id ON Entity TYPE string",
    "DEFINE FIELD type ON Entity TYPE string",
    "DEFINE FIELD name ON Entity TYPE string",
    "DEFINE FIELD properties ON Entity TYPE object",
    "DEFINE INDEX episode_id ON Episode FIELDS id UNIQUE",
    "DEFINE INDEX episode_created_at ON Episode FIELDS created_at",
    "DEFINE INDEX message_id ON Message FIELDS id UNIQUE",
    "DEFINE INDEX message_timestamp ON Message FIELDS timestamp",
    "DEFINE INDEX message_role ON Message FIELDS role",
    "DEFINE INDEX entity_id ON Entity FIELDS id UNIQUE",
    "DEFINE INDEX entity_type ON Entity FIELDS type",
    "DEFINE INDEX entity_name ON Entity FIELDS name",
];

/// Index name/table pairs for the delete-existing path. Dropping an index
/// never touches the records in its table.
const INDEX_NAMES: [(&str, &str); 8] = [
    ("episode_id", "Episode"),
    ("episode_created_at", "Episode"),
    ("message_id", "Message"),
    ("message_timestamp", "Message"),
    ("message_role", "Message"),
    ("entity_id", "Entity"),
    ("entity_type", "Entity"),
    ("entity_name", "Entity"),
];

/// SurrealDB implementation of [`GraphDatabase`].
///
/// Holds one WebSocket client; there is no separate session object, the same
/// handle serves every query after sign-in and namespace selection.
pub struct SurrealDatabase {
    client: Option<Surreal<Client>>,
}

impl SurrealDatabase {
    pub fn new() -> Self {
        Self { client: None }
    }

    fn client(&self) -> Result<&Surreal<Client>, GraphDbError> {
        self.client
            .as_ref()
            .ok_or_else(|| GraphDbError::Connection("not connected to SurrealDB".to_string()))
    }
}

impl Default for SurrealDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphDatabase for SurrealDatabase {
    async fn connect(&mut self, options: ConnectOptions) -> Result<(), GraphDbError> {
        if self.client.is_some() {
            return Err(GraphDbError::Connection(
                "already connected to SurrealDB; close before reconnecting".to_string(),
            ));
        }

        let namespace = options.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let database = options.database.as_deref().unwrap_or(DEFAULT_DATABASE);
        let address = ws_address(&options.uri);

        tracing::debug!("connecting to SurrealDB at {}", options.uri);
        let client = Surreal::new::<Ws>(address).await.map_err(|e| {
            GraphDbError::Connection(format!(
                "failed to connect to SurrealDB at {}: {e}",
                options.uri
            ))
        })?;

        client
            .signin(Root {
                username: &options.user,
                password: &options.password,
            })
            .await
            .map_err(|e| GraphDbError::Connection(format!("SurrealDB sign-in failed: {e}")))?;
        tracing::debug!("signed in to SurrealDB as {}", options.user);

        client
            .use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| {
                GraphDbError::Connection(format!(
                    "failed to select SurrealDB namespace {namespace}/{database}: {e}"
                ))
            })?;

        tracing::info!(
            "connected to SurrealDB at {} (namespace {namespace}, database {database})",
            options.uri
        );
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), GraphDbError> {
        // Dropping the client tears down the WebSocket.
        if self.client.take().is_some() {
            tracing::debug!("closed SurrealDB connection");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    async fn execute_query(
        &self,
        statement: &str,
        parameters: QueryParams,
    ) -> Result<Vec<Record>, GraphDbError> {
        let client = self.client()?;

        let mut request = client.query(statement);
        for (name, value) in parameters {
            request = request.bind((name, value));
        }

        let response = request
            .await
            .map_err(|e| GraphDbError::query(statement, e))?;
        let mut response = response
            .check()
            .map_err(|e| GraphDbError::query(statement, e))?;

        // Flatten multi-statement results in order into one record sequence.
        let mut records = Vec::new();
        for index in 0..response.num_statements() {
            let rows: Vec<serde_json::Value> = response
                .take(index)
                .map_err(|e| GraphDbError::query(statement, e))?;
            records.extend(rows.into_iter().map(record_from_value));
        }
        Ok(records)
    }

    async fn build_indices(&self, delete_existing: bool) -> Result<(), GraphDbError> {
        let client = self.client()?;

        if delete_existing {
            // Drop only the indices; table definitions and data stay intact.
            tracing::debug!("dropping existing SurrealDB indices");
            for (name, table) in INDEX_NAMES {
                let statement = format!("REMOVE INDEX IF EXISTS {name} ON TABLE {table}");
                run_statement(client, &statement).await?;
            }
        }

        for statement in SCHEMA_STATEMENTS {
            run_statement(client, statement).await?;
        }
        tracing::info!(
            "provisioned {} SurrealDB schema definitions",
            SCHEMA_STATEMENTS.len()
        );
        Ok(())
    }

    async fn clear_all_data(&self) -> Result<(), GraphDbError> {
        let client = self.client()?;

        // DELETE removes every record but leaves the schema-full definitions.
        for table in TABLES {
            let statement = format!("DELETE {table}");
            run_statement(client, &statement).await?;
        }
        tracing::info!("cleared all SurrealDB data across {} tables", TABLES.len());
        Ok(())
    }
}

#[async_trait]
impl NativeAccess for SurrealDatabase {
    type Driver = Surreal<Client>;
    type Session = Surreal<Client>;

    fn driver(&self) -> Result<&Surreal<Client>, GraphDbError> {
        self.client()
    }

    /// SurrealDB has no separate session object; the shared client handle
    /// (cheaply cloneable) is the working context.
    async fn session(&self) -> Result<Surreal<Client>, GraphDbError> {
        Ok(self.client()?.clone())
    }
}

async fn run_statement(client: &Surreal<Client>, statement: &str) -> Result<(), GraphDbError> {
    client
        .query(statement)
        .await
        .map_err(|e| GraphDbError::query(statement, e))?
        .check()
        .map_err(|e| GraphDbError::query(statement, e))?;
    Ok(())
}

/// The Ws engine takes a bare address; accept full RPC URIs like
/// `ws://localhost:8001/rpc` as well.
fn ws_address(uri: &str) -> &str {
    let stripped = uri
        .strip_prefix("ws://")
        .or_else(|| uri.strip_prefix("wss://"))
        .unwrap_or(uri);
    stripped.strip_suffix("/rpc").unwrap_or(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn operations_fail_fast_while_disconnected() {
        let db = SurrealDatabase::new();
        assert!(!db.is_connected());

        let err = db
            .execute_query("SELECT * FROM Episode", QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GraphDbError::Connection(_)));

        assert!(matches!(
            db.build_indices(true).await.unwrap_err(),
            GraphDbError::Connection(_)
        ));
        assert!(matches!(
            db.clear_all_data().await.unwrap_err(),
            GraphDbError::Connection(_)
        ));
        assert!(matches!(db.driver().unwrap_err(), GraphDbError::Connection(_)));
        assert!(matches!(
            db.session().await.unwrap_err(),
            GraphDbError::Connection(_)
        ));
    }

    #[tokio::test]
    async fn close_is_a_no_op_while_disconnected() {
        let mut db = SurrealDatabase::new();
        db.close().await.unwrap();
        db.close().await.unwrap();
    }

    #[test]
    fn rpc_uris_reduce_to_bare_addresses() {
        assert_eq!(ws_address("ws://localhost:8001/rpc"), "localhost:8001");
        assert_eq!(ws_address("wss://db.example.com:8000"), "db.example.com:8000");
        assert_eq!(ws_address("localhost:8000"), "localhost:8000");
    }

    #[test]
    fn every_table_is_defined_before_fields_and_indices() {
        for table in TABLES {
            let define = format!("DEFINE TABLE {table} SCHEMAFULL");
            assert!(SCHEMA_STATEMENTS.contains(&define.as_str()));
        }
        // Tables first, then fields, then indices.
        let first_field = SCHEMA_STATEMENTS
            .iter()
            .position(|s| s.starts_with("DEFINE FIELD"))
            .unwrap();
        assert!(SCHEMA_STATEMENTS[..first_field]
            .iter()
            .all(|s| s.starts_with("DEFINE TABLE")));
    }

    #[test]
    fn index_drop_list_matches_the_defined_indices() {
        for (name, table) in INDEX_NAMES {
            let define = format!("DEFINE INDEX {name} ON {table} FIELDS");
            assert!(
                SCHEMA_STATEMENTS.iter().any(|s| s.starts_with(&define)),
                "no definition for index {name} on {table}"
            );
        }
        let defined = SCHEMA_STATEMENTS
            .iter()
            .filter(|s| s.starts_with("DEFINE INDEX"))
            .count();
        assert_eq!(defined, INDEX_NAMES.len());
    }
}
