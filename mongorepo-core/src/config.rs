//! Declarative per-entity configuration.
//!
//! An [`EntityConfig`] names the backing collection of an entity type, the fields whose
//! values must be coerced before they reach the store ([`TransformKind`]), and the fields
//! that reference documents in other collections ([`LookupDescriptor`]).
//!
//! A configuration is immutable once built. It has a canonical JSON text form produced by
//! [`EntityConfig::describe`] and parsed by [`EntityConfig::from_text`], so it can travel
//! attached to an external schema object (see [`SchemaDescription`]).
//!
//! # Example
//!
//! ```ignore
//! use mongorepo_core::config::{EntityConfig, LookupDescriptor, TransformKind};
//!
//! let config = EntityConfig::builder("Transactions")
//!     .transform("_id", TransformKind::ObjectId)
//!     .transform("from", TransformKind::ObjectId)
//!     .transform("date", TransformKind::Timestamp)
//!     .lookup("from", LookupDescriptor::new("Users").expose_as("pf_from"))
//!     .build();
//!
//! let text = config.describe()?;
//! assert_eq!(EntityConfig::from_text(&text)?, config);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RepositoryError, RepositoryResult};

/// Identifier field used as the join key on the referenced collection when none is declared.
pub const DEFAULT_FOREIGN_FIELD: &str = "_id";

/// The coercion applied to a transform field before it is compared or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    /// Hex string to `ObjectId`.
    #[serde(rename = "oid", alias = "identifier")]
    ObjectId,
    /// ISO-8601 string to BSON `DateTime`.
    #[serde(rename = "date", alias = "timestamp")]
    Timestamp,
}

/// Describes how a field resolves to documents of another collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupDescriptor {
    #[serde(rename = "fromCollection")]
    from_store: String,
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    expose_as: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    foreign_field: Option<String>,
    #[serde(rename = "array", default, skip_serializing_if = "std::ops::Not::not")]
    is_array: bool,
}

impl LookupDescriptor {
    /// Creates a one-to-one lookup into `from_store` with every optional key defaulted.
    pub fn new(from_store: impl Into<String>) -> Self {
        Self {
            from_store: from_store.into(),
            expose_as: None,
            local_field: None,
            foreign_field: None,
            is_array: false,
        }
    }

    /// Sets the output field that receives the joined result.
    pub fn expose_as(mut self, field: impl Into<String>) -> Self {
        self.expose_as = Some(field.into());
        self
    }

    /// Sets the field on this entity used as the join key.
    pub fn local_field(mut self, field: impl Into<String>) -> Self {
        self.local_field = Some(field.into());
        self
    }

    /// Sets the field on the referenced entity used as the join key.
    pub fn foreign_field(mut self, field: impl Into<String>) -> Self {
        self.foreign_field = Some(field.into());
        self
    }

    /// Marks the relationship as one-to-many.
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// The referenced collection.
    pub fn from_store(&self) -> &str {
        &self.from_store
    }

    /// The output field, falling back to `field` (the declaring field name).
    pub fn exposed_field<'a>(&'a self, field: &'a str) -> &'a str {
        self.expose_as.as_deref().unwrap_or(field)
    }

    /// The local join key, falling back to `field` (the declaring field name).
    pub fn local_join_field<'a>(&'a self, field: &'a str) -> &'a str {
        self.local_field.as_deref().unwrap_or(field)
    }

    /// The foreign join key, falling back to [`DEFAULT_FOREIGN_FIELD`].
    pub fn foreign_join_field(&self) -> &str {
        self.foreign_field.as_deref().unwrap_or(DEFAULT_FOREIGN_FIELD)
    }

    /// Whether the joined result stays a sequence.
    pub fn is_array(&self) -> bool {
        self.is_array
    }
}

/// Immutable description of one entity type.
///
/// Maps are ordered so that [`describe`](Self::describe) is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    #[serde(rename = "collectionName")]
    store_name: String,
    #[serde(default)]
    transform: BTreeMap<String, TransformKind>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    lookups: BTreeMap<String, LookupDescriptor>,
}

impl EntityConfig {
    /// Creates a configuration with no transforms and no lookups.
    pub fn new(store_name: impl Into<String>) -> Self {
        Self {
            store_name: store_name.into(),
            transform: BTreeMap::new(),
            lookups: BTreeMap::new(),
        }
    }

    /// Creates a builder for the entity stored in `store_name`.
    pub fn builder(store_name: impl Into<String>) -> EntityConfigBuilder {
        EntityConfigBuilder::new(store_name)
    }

    /// Serializes the configuration to its canonical text form.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if JSON encoding fails.
    pub fn describe(&self) -> RepositoryResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a configuration from the text produced by [`describe`](Self::describe).
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MalformedConfiguration`] when `text` is not a
    /// serialized configuration or names an empty collection.
    pub fn from_text(text: &str) -> RepositoryResult<Self> {
        let config: EntityConfig = serde_json::from_str(text)
            .map_err(|e| RepositoryError::MalformedConfiguration(e.to_string()))?;

        if config.store_name.is_empty() {
            return Err(RepositoryError::MalformedConfiguration(
                "collectionName must not be empty".to_string(),
            ));
        }

        Ok(config)
    }

    /// Reads the configuration carried in a schema object's description.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::MalformedConfiguration`] when the schema has no
    /// description or the description does not parse.
    pub fn from_schema<S: SchemaDescription + ?Sized>(schema: &S) -> RepositoryResult<Self> {
        match schema.description() {
            Some(text) => Self::from_text(text),
            None => Err(RepositoryError::MalformedConfiguration(
                "schema has no description".to_string(),
            )),
        }
    }

    /// The backing collection name.
    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Field to coercion kind map.
    pub fn transform(&self) -> &BTreeMap<String, TransformKind> {
        &self.transform
    }

    /// Field to lookup descriptor map.
    pub fn lookups(&self) -> &BTreeMap<String, LookupDescriptor> {
        &self.lookups
    }

    /// Names of the fields that have a declared lookup.
    pub fn lookup_fields(&self) -> Vec<&str> {
        self.lookups.keys().map(String::as_str).collect()
    }

    /// The declared coercion kind of `field`, if any.
    pub fn transform_kind(&self, field: &str) -> Option<TransformKind> {
        self.transform.get(field).copied()
    }

    /// Whether `field` is a transform field.
    pub fn is_transform_field(&self, field: &str) -> bool {
        self.transform.contains_key(field)
    }

    /// The lookup declared on `field`, if any.
    pub fn lookup(&self, field: &str) -> Option<&LookupDescriptor> {
        self.lookups.get(field)
    }
}

/// Fluent builder for [`EntityConfig`].
#[derive(Debug, Clone)]
pub struct EntityConfigBuilder {
    config: EntityConfig,
}

impl EntityConfigBuilder {
    /// Creates a builder for the entity stored in `store_name`.
    pub fn new(store_name: impl Into<String>) -> Self {
        Self { config: EntityConfig::new(store_name) }
    }

    /// Declares `field` as a transform field of the given kind.
    pub fn transform(mut self, field: impl Into<String>, kind: TransformKind) -> Self {
        self.config.transform.insert(field.into(), kind);
        self
    }

    /// Declares a lookup on `field`.
    pub fn lookup(mut self, field: impl Into<String>, descriptor: LookupDescriptor) -> Self {
        self.config.lookups.insert(field.into(), descriptor);
        self
    }

    /// Builds the immutable configuration.
    pub fn build(self) -> EntityConfig {
        self.config
    }
}

/// An external schema object that can carry a free-text description.
///
/// Schema objects whose description holds the text produced by
/// [`EntityConfig::describe`] act as the single source of truth for both structural
/// validation and repository configuration.
pub trait SchemaDescription {
    /// The schema's description, if one was attached.
    fn description(&self) -> Option<&str>;
}

impl SchemaDescription for str {
    fn description(&self) -> Option<&str> {
        Some(self)
    }
}

impl SchemaDescription for String {
    fn description(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<S: SchemaDescription> SchemaDescription for Option<S> {
    fn description(&self) -> Option<&str> {
        self.as_ref().and_then(SchemaDescription::description)
    }
}
