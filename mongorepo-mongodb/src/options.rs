//! Connection settings and driver option mapping.

use mongodb::options::{self as driver, ClientOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use mongorepo_core::{
    error::{RepositoryError, RepositoryResult},
    options::{
        AggregateOptions, CountOptions, DeleteOptions, FindOneAndUpdateOptions, FindOptions,
        InsertOptions, ReturnDocument, UpdateOptions,
    },
};

/// Settings for opening a [`MongoDbConnection`](crate::MongoDbConnection).
///
/// Deserializable so it can live in an application's configuration file:
///
/// ```json
/// { "uri": "mongodb://localhost:27017", "dbName": "payments", "appName": "billing" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MongoDbOptions {
    pub uri: String,
    pub db_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

impl MongoDbOptions {
    pub fn new(uri: impl Into<String>, db_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            db_name: db_name.into(),
            app_name: None,
            max_pool_size: None,
            connect_timeout_ms: None,
        }
    }

    /// Parses the URI and applies the explicit overrides.
    pub(crate) async fn client_options(&self) -> RepositoryResult<ClientOptions> {
        if self.db_name.is_empty() {
            return Err(RepositoryError::Initialization(
                "database name must not be empty".into(),
            ));
        }

        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| RepositoryError::Initialization(e.to_string()))?;

        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(max_pool_size) = self.max_pool_size {
            options.max_pool_size = Some(max_pool_size);
        }
        if let Some(timeout) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(timeout));
        }

        Ok(options)
    }
}

pub(crate) fn find_options(options: FindOptions) -> driver::FindOptions {
    let mut mapped = driver::FindOptions::default();
    mapped.sort = options.sort;
    mapped.skip = options.skip;
    mapped.limit = options.limit;
    mapped.projection = options.projection;
    mapped
}

pub(crate) fn aggregate_options(options: AggregateOptions) -> driver::AggregateOptions {
    let mut mapped = driver::AggregateOptions::default();
    mapped.allow_disk_use = options.allow_disk_use;
    mapped.batch_size = options.batch_size;
    mapped
}

pub(crate) fn find_one_and_update_options(
    options: FindOneAndUpdateOptions,
) -> driver::FindOneAndUpdateOptions {
    let mut mapped = driver::FindOneAndUpdateOptions::default();
    mapped.upsert = Some(options.upsert);
    mapped.return_document = Some(match options.return_document {
        ReturnDocument::Before => driver::ReturnDocument::Before,
        ReturnDocument::After => driver::ReturnDocument::After,
    });
    mapped.sort = options.sort;
    mapped.projection = options.projection;
    mapped
}

pub(crate) fn update_options(options: UpdateOptions) -> driver::UpdateOptions {
    let mut mapped = driver::UpdateOptions::default();
    mapped.upsert = Some(options.upsert);
    mapped
}

pub(crate) fn delete_options(options: DeleteOptions) -> driver::DeleteOptions {
    let mut mapped = driver::DeleteOptions::default();
    mapped.comment = options.comment.map(Into::into);
    mapped
}

pub(crate) fn insert_one_options(options: InsertOptions) -> driver::InsertOneOptions {
    let mut mapped = driver::InsertOneOptions::default();
    mapped.bypass_document_validation = options.bypass_document_validation;
    mapped
}

pub(crate) fn insert_many_options(options: InsertOptions) -> driver::InsertManyOptions {
    let mut mapped = driver::InsertManyOptions::default();
    mapped.ordered = options.ordered;
    mapped.bypass_document_validation = options.bypass_document_validation;
    mapped
}

pub(crate) fn count_options(options: CountOptions) -> driver::CountOptions {
    let mut mapped = driver::CountOptions::default();
    mapped.skip = options.skip;
    mapped.limit = options.limit;
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn deserializes_from_configuration() {
        let options: MongoDbOptions = serde_json::from_str(
            r#"{ "uri": "mongodb://localhost:27017", "dbName": "payments", "maxPoolSize": 20 }"#,
        )
        .unwrap();

        assert_eq!(
            options,
            MongoDbOptions {
                max_pool_size: Some(20),
                ..MongoDbOptions::new("mongodb://localhost:27017", "payments")
            }
        );
    }

    #[test]
    fn missing_database_is_rejected() {
        assert!(serde_json::from_str::<MongoDbOptions>(r#"{ "uri": "mongodb://localhost" }"#).is_err());
    }

    #[test]
    fn maps_find_options() {
        let mapped = find_options(FindOptions::new().sort(doc! { "date": -1 }).skip(5).limit(10));

        assert_eq!(mapped.sort, Some(doc! { "date": -1 }));
        assert_eq!(mapped.skip, Some(5));
        assert_eq!(mapped.limit, Some(10));
        assert_eq!(mapped.projection, None);
    }

    #[test]
    fn maps_find_one_and_update_options() {
        let mapped = find_one_and_update_options(
            FindOneAndUpdateOptions::new()
                .upsert(true)
                .return_document(ReturnDocument::Before),
        );

        assert_eq!(mapped.upsert, Some(true));
        assert!(matches!(mapped.return_document, Some(driver::ReturnDocument::Before)));
    }

    #[test]
    fn maps_write_options() {
        let insert = insert_many_options(InsertOptions { ordered: Some(false), bypass_document_validation: None });
        let count = count_options(CountOptions { skip: Some(1), limit: Some(2) });

        assert_eq!(insert.ordered, Some(false));
        assert_eq!((count.skip, count.limit), (Some(1), Some(2)));
        assert_eq!(update_options(UpdateOptions::new().upsert(true)).upsert, Some(true));
    }
}
