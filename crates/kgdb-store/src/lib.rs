//! Graph store adapters and the backend factory.
//!
//! Each adapter owns exactly one native driver handle and translates the
//! [`GraphDatabase`] contract into backend calls; [`create_database`] picks
//! one from a [`DatabaseType`] selector. Backends are cargo features
//! (`neo4j`, `surrealdb`), both on by default.

mod factory;

#[cfg(feature = "neo4j")]
mod neo4j;
#[cfg(feature = "surrealdb")]
mod surreal;

pub use factory::create_database;
pub use kgdb_types::{
    ConnectOptions, DatabaseType, GraphDatabase, GraphDbError, NativeAccess, QueryParams, Record,
};

#[cfg(feature = "neo4j")]
pub use neo4j::Neo4jDatabase;
#[cfg(feature = "surrealdb")]
pub use surreal::SurrealDatabase;
