//! A configuration-driven repository layer for document stores.
//!
//! This crate is the core of the mongorepo project and provides:
//!
//! - **Entity configuration** ([`config`]) - Per-entity transform and lookup declarations
//! - **Value coercion** ([`coerce`]) - String to ObjectId and timestamp conversion
//! - **Operators** ([`operator`]) - The closed set of recognised query and update operators
//! - **Transform engine** ([`transform`]) - Recursive rewriting of filter, update and insert documents
//! - **Lookups** ([`lookup`]) - Join stage generation and populated row reshaping
//! - **Store connection** ([`connection`]) - Trait implemented by concrete drivers
//! - **Repository** ([`repository`]) - The operation surface composing all of the above
//! - **Validation** ([`validate`]) - Optional document validation on insert
//! - **Registry** ([`registry`]) - Repository tokens and per-connection registration
//! - **Entities** ([`entity`]) - Typed documents that carry their own configuration
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use mongorepo_core::{config::*, repository::Repository};
//! use bson::doc;
//!
//! let config = EntityConfig::builder("Transactions")
//!     .transform("_id", TransformKind::ObjectId)
//!     .transform("from", TransformKind::ObjectId)
//!     .transform("date", TransformKind::Timestamp)
//!     .lookup("from", LookupDescriptor::new("Users").expose_as("pf_from"))
//!     .build();
//!
//! let repo = Repository::new(config, connection);
//! let pending = repo
//!     .find_many(doc! { "from": "6527b103bce59986d40b0657" }, Default::default())
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorepo_core;

pub mod coerce;
pub mod config;
pub mod connection;
pub mod entity;
pub mod error;
pub mod lookup;
pub mod operator;
pub mod options;
pub mod registry;
pub mod repository;
pub mod transform;
pub mod validate;
