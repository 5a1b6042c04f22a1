//! MongoDB store connection for mongorepo.
//!
//! This crate implements `StoreConnection` on top of the official MongoDB driver. Filters,
//! updates and pipelines produced by a repository are passed to the server unchanged.
//!
//! To use this connection, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! mongorepo = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use mongorepo::{connection::ConnectionBuilder, mongodb::MongoDbConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = MongoDbConnection::builder("mongodb://localhost:27017", "payments")
//!         .app_name("billing")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongorepo_mongodb;

pub mod connection;
pub mod options;

pub use connection::{MongoDbConnection, MongoDbConnectionBuilder};
pub use options::MongoDbOptions;
