//! Backend selector and connection parameters.

use crate::GraphDbError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which graph store backend to construct.
///
/// Chosen once per process; anything unrecognized is rejected when the
/// selector is parsed, never at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Neo4j,
    SurrealDb,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::Neo4j => "neo4j",
            DatabaseType::SurrealDb => "surrealdb",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = GraphDbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "neo4j" => Ok(DatabaseType::Neo4j),
            "surrealdb" => Ok(DatabaseType::SurrealDb),
            other => Err(GraphDbError::Configuration(format!(
                "unsupported database type: {other}"
            ))),
        }
    }
}

/// Connection parameters passed by value into [`GraphDatabase::connect`].
///
/// `namespace` and `database` are only meaningful for backends that select a
/// working context after sign-in (SurrealDB); other adapters ignore them.
///
/// [`GraphDatabase::connect`]: crate::GraphDatabase::connect
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub uri: String,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl ConnectOptions {
    pub fn new(
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            user: user.into(),
            password: password.into(),
            namespace: None,
            database: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}
