//! Configuration-driven repositories over MongoDB-style document stores.
//!
//! This crate is the primary entry point of the mongorepo project. It re-exports the
//! core repository layer and the available store connections.
//!
//! # Features
//!
//! - **Declarative configuration** - One [`EntityConfig`](config::EntityConfig) per entity names its collection, coerced fields and lookups
//! - **Automatic coercion** - Identifier and timestamp strings in filters, updates and inserts are converted before they reach the store
//! - **Population** - Declared lookups become join stages, with pagination applied before the join
//! - **Multiple connections** - In-memory and MongoDB connections behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use mongorepo::{prelude::*, memory::InMemoryConnection};
//! use bson::doc;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Arc::new(InMemoryConnection::builder().build().await?);
//!
//!     let transactions = Repository::new(
//!         EntityConfig::builder("Transactions")
//!             .transform("_id", TransformKind::ObjectId)
//!             .transform("from", TransformKind::ObjectId)
//!             .transform("date", TransformKind::Timestamp)
//!             .lookup("from", LookupDescriptor::new("Users").expose_as("pf_from"))
//!             .build(),
//!         connection,
//!     );
//!
//!     transactions
//!         .insert_one(
//!             doc! { "from": "6527b103bce59986d40b0657", "date": "2023-10-03", "amount": 40 },
//!             InsertOptions::default(),
//!         )
//!         .await?;
//!
//!     let populated = transactions
//!         .find_and_populate(doc! {}, PopulateOptions::new().populate("from").limit(10))
//!         .await?;
//!
//!     println!("{populated:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Connections
//!
//! - [`memory`] - In-memory store for development and testing
//! - `mongodb` - MongoDB driver connection (requires the `mongodb` feature)

pub mod prelude;

pub use mongorepo_core::{
    coerce, config, connection, entity, error, lookup, operator, options, registry, repository,
    transform, validate,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory store connection.
pub mod memory {
    pub use mongorepo_memory::{InMemoryConnection, InMemoryConnectionBuilder};
}

/// MongoDB store connection.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use mongorepo_mongodb::{MongoDbConnection, MongoDbConnectionBuilder, MongoDbOptions};
}
