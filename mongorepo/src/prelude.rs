//! Convenient re-exports of commonly used types from mongorepo.
//!
//! ```ignore
//! use mongorepo::prelude::*;
//! ```

pub use mongorepo_core::{
    config::{EntityConfig, EntityConfigBuilder, LookupDescriptor, SchemaDescription, TransformKind},
    connection::{ConnectionBuilder, StoreConnection},
    entity::{DocumentExt, Entity},
    error::{RepositoryError, RepositoryResult},
    options::{
        AggregateOptions, CountOptions, DeleteOptions, FindOneAndUpdateOptions, FindOptions,
        InsertOptions, PopulateOptions, ReturnDocument, UpdateOptions,
    },
    registry::{ConfigRegistry, RepositoryRegistry, repository_token},
    repository::Repository,
    validate::{DocumentValidator, FnValidator, RequiredFields},
};
