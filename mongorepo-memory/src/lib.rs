//! In-memory store connection for mongorepo.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreConnection`
//! trait. It understands the subset of MongoDB filter, update and aggregation syntax that
//! repositories produce, which makes it suitable for tests and local development.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **MongoDB filters** - Equality, comparison operators, `$in`/`$nin`, `$exists`, `$and`/`$or`/`$nor`
//! - **Updates** - `$set`, `$unset`, `$setOnInsert`, `$inc`, `$push`, `$addToSet`, `$pull`, upserts
//! - **Pipelines** - `$match`, `$sort`, `$skip`, `$limit`, `$lookup` and `$unwind`
//! - **Write concern** - Unacknowledged mode for exercising failure paths
//!
//! # Quick Start
//!
//! ```ignore
//! use mongorepo_core::{config::*, connection::ConnectionBuilder, repository::Repository};
//! use mongorepo_memory::InMemoryConnection;
//! use bson::doc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = InMemoryConnection::builder().build().await?;
//!     let users = Repository::new(EntityConfig::new("Users"), Arc::new(connection));
//!
//!     users.insert_one(doc! { "name": "Alice" }, Default::default()).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorepo_memory;

mod evaluator;
mod pipeline;
pub mod store;
mod update;

pub use store::{InMemoryConnection, InMemoryConnectionBuilder};
