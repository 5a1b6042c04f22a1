use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use log::debug;
use mongodb::{Client, Collection as MongoCollection};

use mongorepo_core::{
    connection::{ConnectionBuilder, StoreConnection},
    error::{RepositoryError, RepositoryResult},
    options::{
        AggregateOptions, CountOptions, DeleteOptions, DeleteResult, FindOneAndUpdateOptions,
        FindOneAndUpdateResult, FindOptions, InsertManyResult, InsertOneResult, InsertOptions,
        UpdateOptions, UpdateResult,
    },
};

use crate::options::{
    MongoDbOptions, aggregate_options, count_options, delete_options, find_one_and_update_options,
    find_options, insert_many_options, insert_one_options, update_options,
};

fn backend(error: mongodb::error::Error) -> RepositoryError {
    RepositoryError::Backend(error.to_string())
}

#[derive(Debug, Clone)]
pub struct MongoDbConnection {
    client: Client,
    database: String,
}

impl MongoDbConnection {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbConnectionBuilder {
        MongoDbConnectionBuilder::new(dsn, database)
    }

    /// Opens a connection from deserialized settings.
    pub async fn from_options(options: MongoDbOptions) -> RepositoryResult<Self> {
        let client = Client::with_options(options.client_options().await?)
            .map_err(|e| RepositoryError::Initialization(e.to_string()))?;

        Ok(Self::new(client, options.db_name))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

#[async_trait]
impl StoreConnection for MongoDbConnection {
    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        self.get_collection(collection)
            .find(filter)
            .with_options(find_options(options))
            .await
            .map_err(backend)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend)
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: AggregateOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        self.get_collection(collection)
            .aggregate(pipeline)
            .with_options(aggregate_options(options))
            .await
            .map_err(backend)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend)
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> RepositoryResult<FindOneAndUpdateResult> {
        let upsert = options.upsert;
        let document = self
            .get_collection(collection)
            .find_one_and_update(filter, update)
            .with_options(find_one_and_update_options(options))
            .await
            .map_err(backend)?;

        // The driver reports no outcome beyond the document itself.
        let acknowledged = document.is_some() || upsert;

        Ok(FindOneAndUpdateResult { document, acknowledged })
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> RepositoryResult<UpdateResult> {
        let result = self
            .get_collection(collection)
            .update_many(filter, update)
            .with_options(update_options(options))
            .await
            .map_err(backend)?;

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
            acknowledged: true,
        })
    }

    async fn delete_one(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        let result = self
            .get_collection(collection)
            .delete_one(filter)
            .with_options(delete_options(options))
            .await
            .map_err(backend)?;

        Ok(DeleteResult { deleted_count: result.deleted_count, acknowledged: true })
    }

    async fn delete_many(
        &self,
        filter: Document,
        options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        let result = self
            .get_collection(collection)
            .delete_many(filter)
            .with_options(delete_options(options))
            .await
            .map_err(backend)?;

        Ok(DeleteResult { deleted_count: result.deleted_count, acknowledged: true })
    }

    async fn insert_one(
        &self,
        document: Document,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertOneResult> {
        let result = self
            .get_collection(collection)
            .insert_one(document)
            .with_options(insert_one_options(options))
            .await
            .map_err(backend)?;

        Ok(InsertOneResult { inserted_id: result.inserted_id, acknowledged: true })
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertManyResult> {
        let count = documents.len();
        let mut result = self
            .get_collection(collection)
            .insert_many(documents)
            .with_options(insert_many_options(options))
            .await
            .map_err(backend)?;

        let inserted_ids = (0..count)
            .map(|index| result.inserted_ids.remove(&index).unwrap_or(Bson::Null))
            .collect();

        Ok(InsertManyResult { inserted_ids, acknowledged: true })
    }

    async fn count_documents(
        &self,
        filter: Document,
        options: CountOptions,
        collection: &str,
    ) -> RepositoryResult<u64> {
        self.get_collection(collection)
            .count_documents(filter)
            .with_options(count_options(options))
            .await
            .map_err(backend)
    }

    async fn shutdown(self) -> RepositoryResult<()>
    where
        Self: Sized,
    {
        debug!("shutting down connection to {}", self.database);
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builder for [`MongoDbConnection`].
#[derive(Debug, Clone)]
pub struct MongoDbConnectionBuilder {
    options: MongoDbOptions,
}

impl MongoDbConnectionBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self { options: MongoDbOptions::new(dsn, database) }
    }

    /// Name reported to the server in the connection handshake.
    pub fn app_name(mut self, app_name: &str) -> Self {
        self.options.app_name = Some(app_name.to_string());
        self
    }

    pub fn max_pool_size(mut self, max_pool_size: u32) -> Self {
        self.options.max_pool_size = Some(max_pool_size);
        self
    }

    pub fn connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.options.connect_timeout_ms = Some(timeout);
        self
    }
}

impl From<MongoDbOptions> for MongoDbConnectionBuilder {
    fn from(options: MongoDbOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl ConnectionBuilder for MongoDbConnectionBuilder {
    type Connection = MongoDbConnection;

    async fn build(self) -> RepositoryResult<Self::Connection> {
        debug!("connecting to database {}", self.options.db_name);
        MongoDbConnection::from_options(self.options).await
    }
}
