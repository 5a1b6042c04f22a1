//! The repository facade.
//!
//! A [`Repository`] pairs an immutable [`EntityConfig`] with a shared
//! [`StoreConnection`]. Every filter, update and insert argument is passed through the
//! transform engine before it is delegated to the store; populate reads additionally
//! append the declared lookup stages and reshape the joined rows.
//!
//! # Example
//!
//! ```ignore
//! use mongorepo::prelude::*;
//! use bson::doc;
//!
//! let repo = Repository::new(config, connection.clone());
//!
//! let populated = repo
//!     .find_and_populate(
//!         doc! { "_id": "6527d349bce59986d40b214a" },
//!         PopulateOptions::new().populate("from").populate("users"),
//!     )
//!     .await?;
//! ```

use bson::Document;
use log::debug;
use serde::de::DeserializeOwned;
use std::{fmt, sync::Arc};

use crate::{
    config::{EntityConfig, SchemaDescription},
    connection::StoreConnection,
    entity::{DocumentExt, Entity},
    error::{RepositoryError, RepositoryResult},
    lookup::{build_populate_stages, reshape_populated},
    options::{
        AggregateOptions, CountOptions, DeleteOptions, DeleteResult, FindOneAndUpdateOptions,
        FindOptions, InsertManyResult, InsertOneOutcome, InsertOptions, PopulateOptions,
        UpdateOptions, UpdateResult,
    },
    registry::repository_token,
    transform::{transform_document, transform_documents},
    validate::DocumentValidator,
};

/// Configuration-driven access to one collection.
///
/// Cloning is cheap: the configuration, connection and validator are shared.
///
/// # Type Parameters
///
/// * `C` - The connection type. Use `dyn StoreConnection` for runtime-selected stores.
pub struct Repository<C: StoreConnection + ?Sized> {
    config: Arc<EntityConfig>,
    connection: Arc<C>,
    validator: Option<Arc<dyn DocumentValidator>>,
}

impl<C: StoreConnection + ?Sized> Repository<C> {
    /// Creates a repository for `config` on a shared connection.
    pub fn new(config: EntityConfig, connection: Arc<C>) -> Self {
        Self::from_shared(Arc::new(config), connection)
    }

    /// Creates a repository from an already shared configuration.
    pub fn from_shared(config: Arc<EntityConfig>, connection: Arc<C>) -> Self {
        Self { config, connection, validator: None }
    }

    /// Creates a repository for the entity type `E`.
    pub fn for_entity<E: Entity>(connection: Arc<C>) -> Self {
        Self::new(E::config(), connection)
    }

    /// Creates a repository from the canonical configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MalformedConfiguration`] if `text` does not parse.
    pub fn from_description(text: &str, connection: Arc<C>) -> RepositoryResult<Self> {
        Ok(Self::new(EntityConfig::from_text(text)?, connection))
    }

    /// Creates a repository from a schema object that both describes the configuration
    /// and validates documents.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MalformedConfiguration`] if the schema carries no
    /// usable description.
    pub fn for_schema<S>(schema: Arc<S>, connection: Arc<C>) -> RepositoryResult<Self>
    where
        S: SchemaDescription + DocumentValidator + 'static,
    {
        let config = EntityConfig::from_schema(schema.as_ref())?;

        Ok(Self::new(config, connection).with_validator(schema))
    }

    /// Attaches a validator run against every inserted document.
    pub fn with_validator(mut self, validator: Arc<dyn DocumentValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn store_name(&self) -> &str {
        self.config.store_name()
    }

    /// The registration token of this repository, see [`repository_token`].
    pub fn token(&self) -> String {
        repository_token(self.store_name())
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    /// Rewrites a filter, update or insert document according to the configuration.
    pub fn build_query(&self, document: Document) -> RepositoryResult<Document> {
        transform_document(&self.config, document)
    }

    /// Builds the aggregation pipeline executed by [`find_and_populate`](Self::find_and_populate).
    ///
    /// The pipeline is `$match`, then the pagination stages in the order supplied, then
    /// the lookup stages of every populated field.
    pub fn populate_pipeline(
        &self,
        filter: Document,
        options: &PopulateOptions,
    ) -> RepositoryResult<Vec<Document>> {
        let mut pipeline = vec![bson::doc! { "$match": self.build_query(filter)? }];

        pipeline.extend(options.stages.iter().map(|stage| stage.to_stage()));
        pipeline.extend(build_populate_stages(&self.config, options.populate.as_slice()));

        Ok(pipeline)
    }

    /// Returns every document matching `filter`.
    pub async fn find_many(&self, filter: Document, options: FindOptions) -> RepositoryResult<Vec<Document>> {
        let filter = self.build_query(filter)?;
        debug!("{}: find {:?}", self.store_name(), filter);

        self.connection
            .find(filter, options, self.store_name())
            .await
    }

    /// Returns the first document matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Document, options: FindOptions) -> RepositoryResult<Option<Document>> {
        Ok(self
            .find_many(filter, options.limit(1))
            .await?
            .into_iter()
            .next())
    }

    /// Returns the documents matching `filter` with the requested lookups populated.
    ///
    /// Pagination applies to source documents, before any join. One-to-one lookups
    /// without a match expose `null`; one-to-many lookups always expose an array.
    pub async fn find_and_populate(
        &self,
        filter: Document,
        options: PopulateOptions,
    ) -> RepositoryResult<Vec<Document>> {
        let pipeline = self.populate_pipeline(filter, &options)?;
        debug!("{}: populate pipeline {:?}", self.store_name(), pipeline);

        Ok(self
            .connection
            .aggregate(pipeline, options.aggregate.clone(), self.store_name())
            .await?
            .into_iter()
            .map(|row| reshape_populated(&self.config, options.populate.as_slice(), row))
            .collect())
    }

    /// Atomically updates the first document matching `filter`.
    ///
    /// Returns the post-update document unless the options ask for the pre-image.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UpdateNotAcknowledged`] when the store reports that
    /// the operation did not complete.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> RepositoryResult<Option<Document>> {
        let filter = self.build_query(filter)?;
        let update = self.build_query(update)?;
        debug!("{}: find_one_and_update {:?} {:?}", self.store_name(), filter, update);

        let result = self
            .connection
            .find_one_and_update(filter, update, options, self.store_name())
            .await?;

        if !result.acknowledged {
            return Err(RepositoryError::UpdateNotAcknowledged(format!(
                "findOneAndUpdate on {} did not complete",
                self.store_name()
            )));
        }

        Ok(result.document)
    }

    /// Updates every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UpdateNotAcknowledged`] when the store does not
    /// acknowledge the write.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
    ) -> RepositoryResult<UpdateResult> {
        let filter = self.build_query(filter)?;
        let update = self.build_query(update)?;
        debug!("{}: update_many {:?} {:?}", self.store_name(), filter, update);

        let result = self
            .connection
            .update_many(filter, update, options, self.store_name())
            .await?;

        if !result.acknowledged {
            return Err(RepositoryError::UpdateNotAcknowledged(format!(
                "updateMany on {} was not acknowledged",
                self.store_name()
            )));
        }

        Ok(result)
    }

    pub async fn delete_one(&self, filter: Document, options: DeleteOptions) -> RepositoryResult<DeleteResult> {
        let filter = self.build_query(filter)?;
        debug!("{}: delete_one {:?}", self.store_name(), filter);

        self.connection
            .delete_one(filter, options, self.store_name())
            .await
    }

    pub async fn delete_many(&self, filter: Document, options: DeleteOptions) -> RepositoryResult<DeleteResult> {
        let filter = self.build_query(filter)?;
        debug!("{}: delete_many {:?}", self.store_name(), filter);

        self.connection
            .delete_many(filter, options, self.store_name())
            .await
    }

    /// Validates, transforms and inserts one document.
    ///
    /// The returned outcome carries the caller's original document with the assigned
    /// `_id` merged in.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] if the validator rejects the document and
    /// [`RepositoryError::InsertNotAcknowledged`] if the store does not acknowledge it.
    pub async fn insert_one(&self, document: Document, options: InsertOptions) -> RepositoryResult<InsertOneOutcome> {
        self.validate(&document)?;
        let transformed = self.build_query(document.clone())?;
        debug!("{}: insert_one {:?}", self.store_name(), transformed);

        let result = self
            .connection
            .insert_one(transformed, options, self.store_name())
            .await?;

        if !result.acknowledged {
            return Err(RepositoryError::InsertNotAcknowledged(format!(
                "insertOne on {} was not acknowledged",
                self.store_name()
            )));
        }

        let mut document = document;
        document.insert("_id", result.inserted_id.clone());

        Ok(InsertOneOutcome { result, document })
    }

    /// Validates and transforms each document, then inserts them as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Validation`] if any document is rejected (nothing is
    /// written) and [`RepositoryError::InsertNotAcknowledged`] if the store does not
    /// acknowledge the batch.
    pub async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertOptions,
    ) -> RepositoryResult<InsertManyResult> {
        for document in &documents {
            self.validate(document)?;
        }
        let documents = transform_documents(&self.config, documents)?;
        debug!("{}: insert_many {} documents", self.store_name(), documents.len());

        let result = self
            .connection
            .insert_many(documents, options, self.store_name())
            .await?;

        if !result.acknowledged {
            return Err(RepositoryError::InsertNotAcknowledged(format!(
                "insertMany on {} was not acknowledged",
                self.store_name()
            )));
        }

        Ok(result)
    }

    pub async fn count_documents(&self, filter: Document, options: CountOptions) -> RepositoryResult<u64> {
        let filter = self.build_query(filter)?;
        debug!("{}: count_documents {:?}", self.store_name(), filter);

        self.connection
            .count_documents(filter, options, self.store_name())
            .await
    }

    /// Runs `pipeline` as given. No transform is applied; coercing values inside a raw
    /// pipeline is the caller's responsibility.
    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: AggregateOptions,
    ) -> RepositoryResult<Vec<Document>> {
        debug!("{}: aggregate {} stages", self.store_name(), pipeline.len());

        self.connection
            .aggregate(pipeline, options, self.store_name())
            .await
    }

    /// [`find_many`](Self::find_many), decoded into `T`.
    pub async fn find_many_as<T: DeserializeOwned>(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> RepositoryResult<Vec<T>> {
        decode_all(self.find_many(filter, options).await?)
    }

    /// [`find_one`](Self::find_one), decoded into `T`.
    pub async fn find_one_as<T: DeserializeOwned>(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> RepositoryResult<Option<T>> {
        self.find_one(filter, options)
            .await?
            .map(decode)
            .transpose()
    }

    /// [`find_and_populate`](Self::find_and_populate), decoded into `T`.
    pub async fn find_and_populate_as<T: DeserializeOwned>(
        &self,
        filter: Document,
        options: PopulateOptions,
    ) -> RepositoryResult<Vec<T>> {
        decode_all(self.find_and_populate(filter, options).await?)
    }

    /// Serializes `entity` and inserts it with [`insert_one`](Self::insert_one).
    pub async fn insert_entity<E: Entity>(&self, entity: &E, options: InsertOptions) -> RepositoryResult<InsertOneOutcome> {
        self.insert_one(entity.to_document()?, options).await
    }

    fn validate(&self, document: &Document) -> RepositoryResult<()> {
        match &self.validator {
            Some(validator) => validator.validate(document),
            None => Ok(()),
        }
    }
}

fn decode<T: DeserializeOwned>(document: Document) -> RepositoryResult<T> {
    Ok(bson::de::deserialize_from_document(document)?)
}

fn decode_all<T: DeserializeOwned>(documents: Vec<Document>) -> RepositoryResult<Vec<T>> {
    documents.into_iter().map(decode).collect()
}

impl<C: StoreConnection + ?Sized> Clone for Repository<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            connection: Arc::clone(&self.connection),
            validator: self.validator.clone(),
        }
    }
}

impl<C: StoreConnection + ?Sized> fmt::Debug for Repository<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("config", &self.config)
            .field("connection", &self.connection)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{LookupDescriptor, TransformKind},
        options::{FindOneAndUpdateResult, InsertOneResult, ReturnDocument},
        validate::RequiredFields,
    };
    use async_trait::async_trait;
    use bson::{Bson, doc, oid::ObjectId};
    use std::sync::Mutex;

    const FROM: &str = "6527b103bce59986d40b0657";
    const TO: &str = "6527b103bce59986d40b0658";

    fn oid(hex: &str) -> ObjectId {
        ObjectId::parse_str(hex).unwrap()
    }

    fn config() -> EntityConfig {
        EntityConfig::builder("Transactions")
            .transform("_id", TransformKind::ObjectId)
            .transform("from", TransformKind::ObjectId)
            .transform("to", TransformKind::ObjectId)
            .lookup("from", LookupDescriptor::new("Users").expose_as("pf_from"))
            .lookup("to", LookupDescriptor::new("Users").expose_as("pf_to").array())
            .build()
    }

    /// Records every request and replies with canned results.
    #[derive(Debug, Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<Document>)>>,
        acknowledge: bool,
        rows: Vec<Document>,
    }

    impl Recorder {
        fn acknowledging(rows: Vec<Document>) -> Arc<Self> {
            Arc::new(Self { acknowledge: true, rows, ..Default::default() })
        }

        fn refusing() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn record(&self, op: &str, docs: Vec<Document>) {
            self.calls.lock().unwrap().push((op.to_string(), docs));
        }

        fn calls(&self) -> Vec<(String, Vec<Document>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoreConnection for Recorder {
        async fn find(&self, filter: Document, options: FindOptions, _: &str) -> RepositoryResult<Vec<Document>> {
            self.record("find", vec![filter]);
            let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);
            Ok(self.rows.iter().take(limit).cloned().collect())
        }

        async fn aggregate(&self, pipeline: Vec<Document>, _: AggregateOptions, _: &str) -> RepositoryResult<Vec<Document>> {
            self.record("aggregate", pipeline);
            Ok(self.rows.clone())
        }

        async fn find_one_and_update(
            &self,
            filter: Document,
            update: Document,
            _: FindOneAndUpdateOptions,
            _: &str,
        ) -> RepositoryResult<FindOneAndUpdateResult> {
            self.record("find_one_and_update", vec![filter, update]);
            Ok(FindOneAndUpdateResult {
                document: self.rows.first().cloned(),
                acknowledged: self.acknowledge,
            })
        }

        async fn update_many(&self, filter: Document, update: Document, _: UpdateOptions, _: &str) -> RepositoryResult<UpdateResult> {
            self.record("update_many", vec![filter, update]);
            Ok(UpdateResult { matched_count: 1, modified_count: 1, upserted_id: None, acknowledged: self.acknowledge })
        }

        async fn delete_one(&self, filter: Document, _: DeleteOptions, _: &str) -> RepositoryResult<DeleteResult> {
            self.record("delete_one", vec![filter]);
            Ok(DeleteResult { deleted_count: 1, acknowledged: self.acknowledge })
        }

        async fn delete_many(&self, filter: Document, _: DeleteOptions, _: &str) -> RepositoryResult<DeleteResult> {
            self.record("delete_many", vec![filter]);
            Ok(DeleteResult { deleted_count: 2, acknowledged: self.acknowledge })
        }

        async fn insert_one(&self, document: Document, _: InsertOptions, _: &str) -> RepositoryResult<InsertOneResult> {
            self.record("insert_one", vec![document]);
            Ok(InsertOneResult { inserted_id: Bson::ObjectId(oid(FROM)), acknowledged: self.acknowledge })
        }

        async fn insert_many(&self, documents: Vec<Document>, _: InsertOptions, _: &str) -> RepositoryResult<InsertManyResult> {
            let inserted_ids = documents.iter().map(|_| Bson::ObjectId(ObjectId::new())).collect();
            self.record("insert_many", documents);
            Ok(InsertManyResult { inserted_ids, acknowledged: self.acknowledge })
        }

        async fn count_documents(&self, filter: Document, _: CountOptions, _: &str) -> RepositoryResult<u64> {
            self.record("count_documents", vec![filter]);
            Ok(self.rows.len() as u64)
        }
    }

    #[tokio::test]
    async fn filters_are_transformed_before_delegation() {
        let conn = Recorder::acknowledging(vec![]);
        let repo = Repository::new(config(), conn.clone());

        repo.find_many(doc! { "from": FROM, "$or": [{ "to": TO }] }, FindOptions::new()).await.unwrap();
        repo.count_documents(doc! { "to": { "$in": [TO] } }, CountOptions::default()).await.unwrap();
        repo.delete_one(doc! { "_id": FROM }, DeleteOptions::default()).await.unwrap();
        repo.delete_many(doc! { "from": FROM }, DeleteOptions::default()).await.unwrap();

        assert_eq!(
            conn.calls(),
            vec![
                ("find".to_string(), vec![doc! { "from": oid(FROM), "$or": [{ "to": oid(TO) }] }]),
                ("count_documents".to_string(), vec![doc! { "to": { "$in": [oid(TO)] } }]),
                ("delete_one".to_string(), vec![doc! { "_id": oid(FROM) }]),
                ("delete_many".to_string(), vec![doc! { "from": oid(FROM) }]),
            ]
        );
    }

    #[tokio::test]
    async fn find_one_returns_first_or_none() {
        let empty = Repository::new(config(), Recorder::acknowledging(vec![]));
        assert_eq!(empty.find_one(doc! {}, FindOptions::new()).await.unwrap(), None);

        let repo = Repository::new(config(), Recorder::acknowledging(vec![doc! { "n": 1 }, doc! { "n": 2 }]));
        assert_eq!(repo.find_one(doc! {}, FindOptions::new()).await.unwrap(), Some(doc! { "n": 1 }));
    }

    #[tokio::test]
    async fn populate_pipeline_paginates_before_lookups() {
        let repo = Repository::new(config(), Recorder::acknowledging(vec![]));
        let options = PopulateOptions::new()
            .populate("from")
            .populate("to")
            .populate("status")
            .limit(2)
            .sort(doc! { "date": -1 });

        assert_eq!(
            repo.populate_pipeline(doc! { "from": FROM }, &options).unwrap(),
            vec![
                doc! { "$match": { "from": oid(FROM) } },
                doc! { "$limit": 2_i64 },
                doc! { "$sort": { "date": -1 } },
                doc! { "$lookup": { "from": "Users", "localField": "from", "foreignField": "_id", "as": "pf_from" } },
                doc! { "$unwind": { "path": "$pf_from", "preserveNullAndEmptyArrays": true } },
                doc! { "$lookup": { "from": "Users", "localField": "to", "foreignField": "_id", "as": "pf_to" } },
            ]
        );
    }

    #[tokio::test]
    async fn populated_rows_are_reshaped() {
        let rows = vec![doc! { "pf_from": [], "pf_to": [] }, doc! { "pf_to": [{ "_id": 1 }] }];
        let repo = Repository::new(config(), Recorder::acknowledging(rows));

        let populated = repo
            .find_and_populate(doc! {}, PopulateOptions::new().populate_all(["from", "to"]))
            .await
            .unwrap();

        assert_eq!(
            populated,
            vec![
                doc! { "pf_from": Bson::Null, "pf_to": [] },
                doc! { "pf_to": [{ "_id": 1 }], "pf_from": Bson::Null },
            ]
        );
    }

    #[tokio::test]
    async fn unacknowledged_writes_fail() {
        let conn = Recorder::refusing();
        let repo = Repository::new(config(), conn.clone());

        assert!(matches!(
            repo.find_one_and_update(doc! {}, doc! { "$set": { "to": TO } }, FindOneAndUpdateOptions::new()).await,
            Err(RepositoryError::UpdateNotAcknowledged(_))
        ));
        assert!(matches!(
            repo.update_many(doc! {}, doc! { "$set": { "to": TO } }, UpdateOptions::new()).await,
            Err(RepositoryError::UpdateNotAcknowledged(_))
        ));
        assert!(matches!(
            repo.insert_one(doc! { "from": FROM }, InsertOptions::default()).await,
            Err(RepositoryError::InsertNotAcknowledged(_))
        ));
        assert!(matches!(
            repo.insert_many(vec![doc! { "from": FROM }], InsertOptions::default()).await,
            Err(RepositoryError::InsertNotAcknowledged(_))
        ));
    }

    #[tokio::test]
    async fn updates_are_transformed() {
        let conn = Recorder::acknowledging(vec![doc! { "_id": oid(FROM) }]);
        let repo = Repository::new(config(), conn.clone());

        let updated = repo
            .find_one_and_update(
                doc! { "_id": FROM },
                doc! { "$setOnInsert": { "from": FROM, "to": [TO] } },
                FindOneAndUpdateOptions::new().upsert(true).return_document(ReturnDocument::After),
            )
            .await
            .unwrap();

        assert_eq!(updated, Some(doc! { "_id": oid(FROM) }));
        assert_eq!(
            conn.calls()[0].1,
            vec![
                doc! { "_id": oid(FROM) },
                doc! { "$setOnInsert": { "from": oid(FROM), "to": [oid(TO)] } },
            ]
        );
    }

    #[tokio::test]
    async fn insert_one_merges_assigned_id_into_original() {
        let conn = Recorder::acknowledging(vec![]);
        let repo = Repository::new(config(), conn.clone());

        let outcome = repo.insert_one(doc! { "from": FROM, "status": "PENDING" }, InsertOptions::default()).await.unwrap();

        assert_eq!(outcome.document, doc! { "from": FROM, "status": "PENDING", "_id": oid(FROM) });
        assert_eq!(conn.calls()[0].1, vec![doc! { "from": oid(FROM), "status": "PENDING" }]);
    }

    #[tokio::test]
    async fn validator_runs_before_inserts() {
        let conn = Recorder::acknowledging(vec![]);
        let repo = Repository::new(config(), conn.clone())
            .with_validator(Arc::new(RequiredFields::new(["status"])));

        assert!(matches!(
            repo.insert_many(vec![doc! { "status": "PENDING" }, doc! { "from": FROM }], InsertOptions::default()).await,
            Err(RepositoryError::Validation(_))
        ));
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn raw_aggregate_is_not_transformed() {
        let conn = Recorder::acknowledging(vec![]);
        let repo = Repository::new(config(), conn.clone());
        let pipeline = vec![doc! { "$match": { "from": FROM } }];

        repo.aggregate(pipeline.clone(), AggregateOptions::default()).await.unwrap();

        assert_eq!(conn.calls(), vec![("aggregate".to_string(), pipeline)]);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let conn = Recorder::acknowledging(vec![]);
        let repo = Repository::new(config(), conn.clone());

        assert!(matches!(
            repo.find_many(doc! { "from": "not-an-id" }, FindOptions::new()).await,
            Err(RepositoryError::InvalidIdentifier { .. })
        ));
        assert!(conn.calls().is_empty());
    }

    #[tokio::test]
    async fn dyn_connections_are_supported() {
        let conn: Arc<dyn StoreConnection> = Recorder::acknowledging(vec![doc! { "n": 1 }]);
        let repo: Repository<dyn StoreConnection> = Repository::new(config(), conn);

        assert_eq!(repo.count_documents(doc! {}, CountOptions::default()).await.unwrap(), 1);
        assert_eq!(repo.token(), "Transactions@MongoDbRepo");
    }
}
