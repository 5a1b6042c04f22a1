//! In-memory store connection.
//!
//! Collections are kept as insertion-ordered vectors of BSON documents behind an
//! async-aware read-write lock. Filters, updates and pipelines use MongoDB syntax, so a
//! repository behaves the same on this store as on a live database for the supported
//! subset of operators.

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use log::debug;
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc};

use mongorepo_core::{
    connection::{ConnectionBuilder, StoreConnection},
    error::{RepositoryError, RepositoryResult},
    options::{
        AggregateOptions, CountOptions, DeleteOptions, DeleteResult, FindOneAndUpdateOptions,
        FindOneAndUpdateResult, FindOptions, InsertManyResult, InsertOneResult, InsertOptions,
        ReturnDocument, UpdateOptions, UpdateResult,
    },
};

use crate::{
    evaluator::{Comparable, matches, truthy},
    pipeline::{compare_by, run_pipeline, sort_documents},
    update::{apply_update, seed_from_filter},
};

pub(crate) type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document store.
///
/// Clones share the same underlying data.
///
/// With `acknowledge_writes` disabled every write is dropped and reported as
/// unacknowledged, which is how an unacknowledged write concern looks to a repository.
///
/// # Example
///
/// ```ignore
/// use mongorepo_memory::InMemoryConnection;
/// use mongorepo_core::connection::ConnectionBuilder;
///
/// let connection = InMemoryConnection::builder().build().await?;
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryConnection {
    store: Arc<RwLock<StoreMap>>,
    acknowledge_writes: bool,
}

impl Default for InMemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryConnection {
    /// Creates an empty store that acknowledges writes.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            acknowledge_writes: true,
        }
    }

    pub fn builder() -> InMemoryConnectionBuilder {
        InMemoryConnectionBuilder::default()
    }

    pub fn acknowledges_writes(&self) -> bool {
        self.acknowledge_writes
    }

    /// Replaces the contents of `collection`, bypassing every check.
    pub async fn seed(&self, collection: &str, documents: Vec<Document>) {
        self.store
            .write()
            .await
            .insert(collection.to_string(), documents);
    }

    /// A snapshot of every document in `collection`, in insertion order.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn list_collections(&self) -> Vec<String> {
        self.store.read().await.keys().cloned().collect()
    }
}

fn select(documents: &[Document], filter: &Document) -> RepositoryResult<Vec<usize>> {
    let mut positions = Vec::new();
    for (position, document) in documents.iter().enumerate() {
        if matches(document, filter)? {
            positions.push(position);
        }
    }
    Ok(positions)
}

fn project(document: Document, projection: Option<&Document>) -> Document {
    let Some(projection) = projection.filter(|p| !p.is_empty()) else {
        return document;
    };

    let include = projection
        .iter()
        .any(|(key, value)| key != "_id" && truthy(value));
    let keep_id = projection.get("_id").is_none_or(truthy);

    document
        .into_iter()
        .filter(|(key, _)| match key.as_str() {
            "_id" => keep_id,
            key if include => projection.get(key).is_some_and(truthy),
            key => projection.get(key).is_none(),
        })
        .collect()
}

/// Puts `_id` first, generating one when absent.
fn with_id(document: Document) -> (Bson, Document) {
    let id = document
        .get("_id")
        .cloned()
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

    let mut stored = Document::new();
    stored.insert("_id", id.clone());
    for (key, value) in document {
        if key != "_id" {
            stored.insert(key, value);
        }
    }

    (id, stored)
}

fn insert_into(
    documents: &mut Vec<Document>,
    document: Document,
    collection: &str,
) -> RepositoryResult<Bson> {
    let (id, stored) = with_id(document);

    if documents
        .iter()
        .any(|existing| existing.get("_id").is_some_and(|e| Comparable::from(e) == Comparable::from(&id)))
    {
        return Err(RepositoryError::Backend(format!(
            "duplicate key {id} in collection {collection}"
        )));
    }

    documents.push(stored);
    Ok(id)
}

/// Builds the document an upsert inserts.
fn upserted(filter: &Document, update: &Document) -> RepositoryResult<Document> {
    let mut document = seed_from_filter(filter)?;
    apply_update(&mut document, update, true)?;
    Ok(with_id(document).1)
}

#[async_trait]
impl StoreConnection for InMemoryConnection {
    async fn find(
        &self,
        filter: Document,
        options: FindOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        debug!("in-memory find on {collection}: {filter}");

        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut found: Vec<Document> = select(documents, &filter)?
            .into_iter()
            .map(|position| documents[position].clone())
            .collect();

        if let Some(sort) = &options.sort {
            sort_documents(&mut found, sort);
        }

        let skip = options.skip.map_or(0, |skip| skip as usize);
        let take = match options.limit {
            Some(limit) if limit != 0 => limit.unsigned_abs() as usize,
            _ => usize::MAX,
        };

        Ok(found
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|document| project(document, options.projection.as_ref()))
            .collect())
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        _options: AggregateOptions,
        collection: &str,
    ) -> RepositoryResult<Vec<Document>> {
        debug!("in-memory aggregate on {collection}: {} stages", pipeline.len());

        let store = self.store.read().await;
        run_pipeline(&store, collection, &pipeline)
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> RepositoryResult<FindOneAndUpdateResult> {
        if !self.acknowledge_writes {
            return Ok(FindOneAndUpdateResult { document: None, acknowledged: false });
        }

        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();

        let mut positions = select(documents, &filter)?;
        if let Some(sort) = &options.sort {
            positions.sort_by(|a, b| compare_by(sort, &documents[*a], &documents[*b]));
        }

        let (before, after) = match positions.first() {
            Some(&position) => {
                let before = documents[position].clone();
                let mut updated = before.clone();
                apply_update(&mut updated, &update, false)?;
                documents[position] = updated.clone();
                (Some(before), updated)
            }
            None if options.upsert => {
                let document = upserted(&filter, &update)?;
                insert_into(documents, document.clone(), collection)?;
                (None, document)
            }
            None => return Ok(FindOneAndUpdateResult { document: None, acknowledged: false }),
        };

        let document = match options.return_document {
            ReturnDocument::Before => before,
            ReturnDocument::After => Some(after),
        };

        Ok(FindOneAndUpdateResult {
            document: document.map(|document| project(document, options.projection.as_ref())),
            acknowledged: true,
        })
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> RepositoryResult<UpdateResult> {
        if !self.acknowledge_writes {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
                acknowledged: false,
            });
        }

        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();
        let positions = select(documents, &filter)?;

        if positions.is_empty() && options.upsert {
            let id = insert_into(documents, upserted(&filter, &update)?, collection)?;
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
                upserted_id: Some(id),
                acknowledged: true,
            });
        }

        // Apply to copies first so a failing update leaves the collection untouched.
        let mut updated = Vec::with_capacity(positions.len());
        for &position in &positions {
            let mut document = documents[position].clone();
            apply_update(&mut document, &update, false)?;
            updated.push((position, document));
        }

        let mut modified_count = 0;
        for (position, document) in updated {
            if documents[position] != document {
                modified_count += 1;
                documents[position] = document;
            }
        }

        Ok(UpdateResult {
            matched_count: positions.len() as u64,
            modified_count,
            upserted_id: None,
            acknowledged: true,
        })
    }

    async fn delete_one(
        &self,
        filter: Document,
        _options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        if !self.acknowledge_writes {
            return Ok(DeleteResult { deleted_count: 0, acknowledged: false });
        }

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(DeleteResult { deleted_count: 0, acknowledged: true });
        };

        let deleted_count = match select(documents, &filter)?.first() {
            Some(&position) => {
                documents.remove(position);
                1
            }
            None => 0,
        };

        Ok(DeleteResult { deleted_count, acknowledged: true })
    }

    async fn delete_many(
        &self,
        filter: Document,
        _options: DeleteOptions,
        collection: &str,
    ) -> RepositoryResult<DeleteResult> {
        if !self.acknowledge_writes {
            return Ok(DeleteResult { deleted_count: 0, acknowledged: false });
        }

        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(DeleteResult { deleted_count: 0, acknowledged: true });
        };

        let mut kept = Vec::with_capacity(documents.len());
        let mut deleted_count = 0;
        for document in documents.drain(..) {
            if matches(&document, &filter)? {
                deleted_count += 1;
            } else {
                kept.push(document);
            }
        }
        *documents = kept;

        Ok(DeleteResult { deleted_count, acknowledged: true })
    }

    async fn insert_one(
        &self,
        document: Document,
        _options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertOneResult> {
        if !self.acknowledge_writes {
            return Ok(InsertOneResult {
                inserted_id: document.get("_id").cloned().unwrap_or(Bson::Null),
                acknowledged: false,
            });
        }

        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_default();
        let inserted_id = insert_into(documents, document, collection)?;

        Ok(InsertOneResult { inserted_id, acknowledged: true })
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: InsertOptions,
        collection: &str,
    ) -> RepositoryResult<InsertManyResult> {
        if !self.acknowledge_writes {
            return Ok(InsertManyResult { inserted_ids: vec![], acknowledged: false });
        }

        let ordered = options.ordered.unwrap_or(true);
        let mut store = self.store.write().await;
        let stored = store.entry(collection.to_string()).or_default();

        let mut inserted_ids = Vec::with_capacity(documents.len());
        let mut first_error = None;
        for document in documents {
            match insert_into(stored, document, collection) {
                Ok(id) => inserted_ids.push(id),
                Err(error) if ordered => return Err(error),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(InsertManyResult { inserted_ids, acknowledged: true }),
        }
    }

    async fn count_documents(
        &self,
        filter: Document,
        options: CountOptions,
        collection: &str,
    ) -> RepositoryResult<u64> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(0);
        };

        let matched = select(documents, &filter)?.len() as u64;
        let remaining = matched.saturating_sub(options.skip.unwrap_or(0));

        Ok(match options.limit {
            Some(limit) if limit > 0 => remaining.min(limit),
            _ => remaining,
        })
    }
}

/// Builder for [`InMemoryConnection`].
///
/// # Example
///
/// ```ignore
/// use mongorepo_memory::InMemoryConnection;
/// use mongorepo_core::connection::ConnectionBuilder;
///
/// let unacknowledged = InMemoryConnection::builder()
///     .acknowledge_writes(false)
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryConnectionBuilder {
    acknowledge_writes: bool,
}

impl Default for InMemoryConnectionBuilder {
    fn default() -> Self {
        Self { acknowledge_writes: true }
    }
}

impl InMemoryConnectionBuilder {
    /// Whether writes are applied and acknowledged. Defaults to `true`.
    pub fn acknowledge_writes(mut self, acknowledge: bool) -> Self {
        self.acknowledge_writes = acknowledge;
        self
    }
}

#[async_trait]
impl ConnectionBuilder for InMemoryConnectionBuilder {
    type Connection = InMemoryConnection;

    async fn build(self) -> RepositoryResult<Self::Connection> {
        Ok(InMemoryConnection {
            acknowledge_writes: self.acknowledge_writes,
            ..InMemoryConnection::new()
        })
    }
}
