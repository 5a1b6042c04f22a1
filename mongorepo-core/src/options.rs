//! Per-operation options and store results.
//!
//! Options are plain data with fluent setters. Results mirror what a document store
//! reports for each write, including whether the write was acknowledged.

use bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// Options for [`find_many`](crate::repository::Repository::find_many) and
/// [`find_one`](crate::repository::Repository::find_one).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
    pub projection: Option<Document>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// A pagination stage of a populate read, kept in the order it was supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum PageStage {
    Sort(Document),
    Skip(u64),
    Limit(i64),
}

impl PageStage {
    /// The aggregation stage document for this step.
    pub fn to_stage(&self) -> Document {
        match self {
            PageStage::Sort(sort) => bson::doc! { "$sort": sort.clone() },
            PageStage::Skip(skip) => {
                bson::doc! { "$skip": Bson::Int64(i64::try_from(*skip).unwrap_or(i64::MAX)) }
            }
            PageStage::Limit(limit) => bson::doc! { "$limit": Bson::Int64(*limit) },
        }
    }
}

/// Options for [`find_and_populate`](crate::repository::Repository::find_and_populate).
///
/// Pagination stages run before any lookup, so `limit` counts source documents rather
/// than joined rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulateOptions {
    pub populate: Vec<String>,
    pub stages: Vec<PageStage>,
    pub aggregate: AggregateOptions,
}

impl PopulateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests population of a field with a declared lookup.
    pub fn populate(mut self, field: impl Into<String>) -> Self {
        self.populate.push(field.into());
        self
    }

    pub fn populate_all<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.populate.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.stages.push(PageStage::Sort(sort));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.stages.push(PageStage::Skip(skip));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.stages.push(PageStage::Limit(limit));
        self
    }

    pub fn aggregate_options(mut self, options: AggregateOptions) -> Self {
        self.aggregate = options;
        self
    }
}

/// Which version of the document `find_one_and_update` returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnDocument {
    Before,
    #[default]
    After,
}

/// Options for [`find_one_and_update`](crate::repository::Repository::find_one_and_update).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndUpdateOptions {
    pub upsert: bool,
    pub return_document: ReturnDocument,
    pub sort: Option<Document>,
    pub projection: Option<Document>,
}

impl FindOneAndUpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    pub fn return_document(mut self, return_document: ReturnDocument) -> Self {
        self.return_document = return_document;
        self
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    pub upsert: bool,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOptions {
    /// Stop a batch insert at the first failure. Stores default to `true`.
    pub ordered: Option<bool>,
    pub bypass_document_validation: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountOptions {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub allow_disk_use: Option<bool>,
    pub batch_size: Option<u32>,
}

/// Outcome of an atomic find-and-update.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOneAndUpdateResult {
    /// The document before or after the update, as requested. `None` when nothing
    /// matched, or when an upsert inserted a document and the pre-image was requested.
    pub document: Option<Document>,
    /// Whether the store completed the operation.
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    pub inserted_id: Bson,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    /// Assigned identifiers, in input order.
    pub inserted_ids: Vec<Bson>,
    pub acknowledged: bool,
}

/// Result of [`insert_one`](crate::repository::Repository::insert_one): the store's
/// result plus the caller's document merged with its assigned `_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneOutcome {
    pub result: InsertOneResult,
    pub document: Document,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn skip_saturates_at_the_largest_stage_value() {
        assert_eq!(PageStage::Skip(10).to_stage(), doc! { "$skip": 10_i64 });
        assert_eq!(PageStage::Skip(u64::MAX).to_stage(), doc! { "$skip": i64::MAX });
    }
}
