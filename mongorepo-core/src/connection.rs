//! The store connection seam.
//!
//! The repository never talks to a database directly. It issues requests through the
//! [`StoreConnection`] trait, which concrete drivers implement. A connection is shared
//! by every repository built on it, so implementations must be thread-safe and own
//! their own pooling, retry and backpressure policies.
//!
//! # Examples
//!
//! ```ignore
//! use mongorepo_core::connection::StoreConnection;
//! use bson::doc;
//!
//! let users = connection
//!     .find(doc! { "name": "Alice" }, FindOptions::default(), "users")
//!     .await?;
//! ```

use async_trait::async_trait;
use bson::Document;
use std::{fmt::Debug, sync::Arc};

use crate::{
    error::RepositoryResult,
    options::{
        AggregateOptions, CountOptions, DeleteOptions, DeleteResult, FindOneAndUpdateOptions,
        FindOneAndUpdateResult, FindOptions, InsertManyResult, InsertOneResult, InsertOptions,
        UpdateOptions, UpdateResult,
    },
};

/// Abstract interface to a document store.
///
/// Every method names the collection it targets as its last argument. Filters, updates
/// and documents arrive already transformed; implementations execute them verbatim.
///
/// # Acknowledgement
///
/// Write results carry an `acknowledged` flag. Implementations report `false` when the
/// store did not complete the write, and the repository turns that into
/// [`UpdateNotAcknowledged`](crate::error::RepositoryError::UpdateNotAcknowledged) or
/// [`InsertNotAcknowledged`](crate::error::RepositoryError::InsertNotAcknowledged).
/// `find_one_and_update` reports `false` when no document matched and no upsert was
/// requested.
///
/// # Errors
///
/// Connectivity and driver failures are returned as
/// [`Backend`](crate::error::RepositoryError::Backend) errors.
#[async_trait]
pub trait StoreConnection: Send + Sync + Debug {
    /// Returns every document matching `filter`.
    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>>;

    /// Runs an aggregation pipeline and collects its output.
    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: AggregateOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>>;

    /// Atomically updates the first document matching `filter`.
    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> RepositoryResult<FindOneAndUpdateResult>;

    /// Updates every document matching `filter`.
    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> RepositoryResult<UpdateResult>;

    /// Deletes the first document matching `filter`.
    async fn delete_one(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult>;

    /// Deletes every document matching `filter`.
    async fn delete_many(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult>;

    /// Inserts one document, assigning an `_id` when it has none.
    async fn insert_one(
        &self,
        document: Document,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertOneResult>;

    /// Inserts a batch of documents.
    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertManyResult>;

    /// Counts the documents matching `filter`.
    async fn count_documents(
        &self,
        filter: Document,
        options: CountOptions,
        collection: &str,
    ) -> RepositoryResult<u64>;

    /// Releases the connection's resources. The default is a no-op.
    async fn shutdown(self) -> RepositoryResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<C> StoreConnection for &C
where
    C: StoreConnection + ?Sized,
{
    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        (**self).find(filter, options, collection).await
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: AggregateOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        (**self).aggregate(pipeline, options, collection).await
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> RepositoryResult<FindOneAndUpdateResult> {
        (**self)
            .find_one_and_update(filter, update, options, collection)
            .await
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> RepositoryResult<UpdateResult> {
        (**self)
            .update_many(filter, update, options, collection)
            .await
    }

    async fn delete_one(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        (**self).delete_one(filter, options, collection).await
    }

    async fn delete_many(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        (**self).delete_many(filter, options, collection).await
    }

    async fn insert_one(
        &self,
        document: Document,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertOneResult> {
        (**self).insert_one(document, options, collection).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertManyResult> {
        (**self).insert_many(documents, options, collection).await
    }

    async fn count_documents(
        &self,
        filter: Document,
        options: CountOptions,
        collection: &str,
    ) -> RepositoryResult<u64> {
        (**self).count_documents(filter, options, collection).await
    }
}

#[async_trait]
impl<C> StoreConnection for Arc<C>
where
    C: StoreConnection + ?Sized,
{
    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        (**self).find(filter, options, collection).await
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: AggregateOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        (**self).aggregate(pipeline, options, collection).await
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> RepositoryResult<FindOneAndUpdateResult> {
        (**self)
            .find_one_and_update(filter, update, options, collection)
            .await
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> RepositoryResult<UpdateResult> {
        (**self)
            .update_many(filter, update, options, collection)
            .await
    }

    async fn delete_one(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        (**self).delete_one(filter, options, collection).await
    }

    async fn delete_many(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        (**self).delete_many(filter, options, collection).await
    }

    async fn insert_one(
        &self,
        document: Document,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertOneResult> {
        (**self).insert_one(document, options, collection).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertManyResult> {
        (**self).insert_many(documents, options, collection).await
    }

    async fn count_documents(
        &self,
        filter: Document,
        options: CountOptions,
        collection: &str,
    ) -> RepositoryResult<u64> {
        (**self).count_documents(filter, options, collection).await
    }
}

/// Factory for connections that need asynchronous setup.
#[async_trait]
pub trait ConnectionBuilder {
    type Connection: StoreConnection;

    async fn build(self) -> RepositoryResult<Self::Connection>;
}
