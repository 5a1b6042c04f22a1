//! Typed entities.
//!
//! An [`Entity`] is a serde type that knows its own [`EntityConfig`]. Repositories can be
//! built straight from the type, and results can be decoded into it.

use bson::{Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};

use crate::{config::EntityConfig, error::RepositoryResult};

/// A document type with a declared repository configuration.
///
/// # Example
///
/// ```ignore
/// use mongorepo::prelude::*;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id")]
///     pub id: bson::oid::ObjectId,
///     pub name: String,
/// }
///
/// impl Entity for User {
///     fn config() -> EntityConfig {
///         EntityConfig::builder("Users")
///             .transform("_id", TransformKind::ObjectId)
///             .build()
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The configuration shared by every repository of this entity.
    fn config() -> EntityConfig;
}

/// BSON conversions for serde types.
///
/// Implemented for every `Serialize + DeserializeOwned` type, entities included.
pub trait DocumentExt: Sized {
    /// Serializes `self` into a BSON document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if `self` does not serialize to a document.
    fn to_document(&self) -> RepositoryResult<Document>;

    /// Decodes a BSON document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the document does not match the type.
    fn from_document(document: Document) -> RepositoryResult<Self>;
}

impl<T: Serialize + DeserializeOwned> DocumentExt for T {
    fn to_document(&self) -> RepositoryResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> RepositoryResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::TransformKind, error::RepositoryError};
    use bson::{doc, oid::ObjectId};
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        #[serde(rename = "_id")]
        id: ObjectId,
        name: String,
    }

    impl Entity for User {
        fn config() -> EntityConfig {
            EntityConfig::builder("Users")
                .transform("_id", TransformKind::ObjectId)
                .build()
        }
    }

    #[test]
    fn converts_to_and_from_documents() {
        let id = ObjectId::new();
        let user = User { id, name: "wendywong".into() };

        let document = user.to_document().unwrap();
        assert_eq!(document, doc! { "_id": id, "name": "wendywong" });
        assert_eq!(User::from_document(document).unwrap(), user);
        assert_eq!(User::config().store_name(), "Users");
    }

    #[test]
    fn mismatched_document_is_a_serialization_error() {
        assert!(matches!(
            User::from_document(doc! { "name": 3 }),
            Err(RepositoryError::Serialization(_))
        ));
    }
}
