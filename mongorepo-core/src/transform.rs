//! Recursive rewriting of filter, update and insert documents.
//!
//! The engine walks a document level by level. At each key it decides between three
//! cases:
//!
//! 1. the key is a transform field: its value is coerced, either directly (scalar or
//!    array) or under each comparison operator of an operator-only sub-document;
//! 2. the key is a structural operator (`$set`, `$or`, ...): the engine recurses into
//!    the operand as if it were a top-level document;
//! 3. anything else, `$unset` included, is copied through untouched.
//!
//! The rewrite is a pure function of its inputs and is idempotent.

use bson::{Bson, Document};

use crate::{
    coerce::coerce,
    config::EntityConfig,
    error::RepositoryResult,
    operator::Operator,
};

/// Returns a copy of `document` with every value tied to a transform field coerced.
///
/// # Errors
///
/// Propagates coercion failures ([`InvalidIdentifier`](crate::error::RepositoryError::InvalidIdentifier),
/// [`InvalidTimestamp`](crate::error::RepositoryError::InvalidTimestamp)).
pub fn transform_document(config: &EntityConfig, document: Document) -> RepositoryResult<Document> {
    document
        .into_iter()
        .map(|(key, value)| {
            let value = transform_entry(config, &key, value)?;
            Ok((key, value))
        })
        .collect()
}

/// Applies [`transform_document`] to each document of a batch.
pub fn transform_documents(
    config: &EntityConfig,
    documents: Vec<Document>,
) -> RepositoryResult<Vec<Document>> {
    documents
        .into_iter()
        .map(|document| transform_document(config, document))
        .collect()
}

fn transform_entry(config: &EntityConfig, key: &str, value: Bson) -> RepositoryResult<Bson> {
    if config.is_transform_field(key) {
        return match value {
            Bson::Document(operators) if is_comparison_document(&operators) => {
                Ok(Bson::Document(coerce_operands(config, key, operators)?))
            }
            Bson::Document(other) => Ok(Bson::Document(other)),
            scalar_or_array => coerce(config, key, scalar_or_array),
        };
    }

    if Operator::is_structural(key) {
        return transform_operand(config, value);
    }

    Ok(value)
}

/// Recurses into the operand of a structural operator.
fn transform_operand(config: &EntityConfig, operand: Bson) -> RepositoryResult<Bson> {
    match operand {
        Bson::Document(document) => Ok(Bson::Document(transform_document(config, document)?)),
        Bson::Array(items) => Ok(Bson::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Bson::Document(document) => {
                        Ok(Bson::Document(transform_document(config, document)?))
                    }
                    other => Ok(other),
                })
                .collect::<RepositoryResult<Vec<_>>>()?,
        )),
        other => Ok(other),
    }
}

fn coerce_operands(config: &EntityConfig, field: &str, operators: Document) -> RepositoryResult<Document> {
    operators
        .into_iter()
        .map(|(op, operand)| {
            let operand = coerce(config, field, operand)?;
            Ok((op, operand))
        })
        .collect()
}

/// An empty document is not an operator document.
fn is_comparison_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|key| Operator::is_comparison(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{LookupDescriptor, TransformKind},
        error::RepositoryError,
    };
    use bson::{DateTime, doc, oid::ObjectId};
    use proptest::prelude::*;

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
            .transform("users", TransformKind::ObjectId)
            .transform("date", TransformKind::Timestamp)
            .lookup("from", LookupDescriptor::new("Users").expose_as("pf_from"))
            .build()
    }

    #[test]
    fn coerces_top_level_and_nested_or() {
        let filter = doc! { "from": FROM, "$or": [{ "to": TO }] };

        assert_eq!(
            transform_document(&config(), filter).unwrap(),
            doc! { "from": oid(FROM), "$or": [{ "to": oid(TO) }] }
        );
    }

    #[test]
    fn coerces_comparison_operands() {
        let filter = doc! {
            "users": { "$in": [FROM, TO] },
            "date": { "$gte": "2023-10-03", "$lt": "2023-10-04" },
        };

        assert_eq!(
            transform_document(&config(), filter).unwrap(),
            doc! {
                "users": { "$in": [oid(FROM), oid(TO)] },
                "date": {
                    "$gte": DateTime::from_millis(1_696_291_200_000),
                    "$lt": DateTime::from_millis(1_696_377_600_000),
                },
            }
        );
    }

    #[test]
    fn leaves_unrecognised_sub_documents_alone() {
        let filter = doc! {
            "from": { "$exists": true },
            "to": { "$in": [TO], "$regex": "^6527" },
            "date": {},
        };

        assert_eq!(transform_document(&config(), filter.clone()).unwrap(), filter);
    }

    #[test]
    fn recurses_into_update_operators() {
        let update = doc! {
            "$setOnInsert": {
                "from": FROM,
                "users": [FROM, TO],
                "date": "2023-10-03 00:00",
                "status": "PENDING",
            },
            "$push": { "users": TO },
            "$unset": { "to": "" },
        };

        assert_eq!(
            transform_document(&config(), update).unwrap(),
            doc! {
                "$setOnInsert": {
                    "from": oid(FROM),
                    "users": [oid(FROM), oid(TO)],
                    "date": DateTime::from_millis(1_696_291_200_000),
                    "status": "PENDING",
                },
                "$push": { "users": oid(TO) },
                "$unset": { "to": "" },
            }
        );
    }

    #[test]
    fn nested_logical_operators() {
        let filter = doc! {
            "$and": [
                { "$or": [{ "from": FROM }, { "to": { "$ne": TO } }] },
                { "$nor": [{ "_id": FROM }] },
            ],
        };

        assert_eq!(
            transform_document(&config(), filter).unwrap(),
            doc! {
                "$and": [
                    { "$or": [{ "from": oid(FROM) }, { "to": { "$ne": oid(TO) } }] },
                    { "$nor": [{ "_id": oid(FROM) }] },
                ],
            }
        );
    }

    #[test]
    fn untouched_keys_keep_their_values_and_order() {
        let filter = doc! { "status": "PENDING", "from": FROM, "nested": { "from": FROM } };
        let transformed = transform_document(&config(), filter).unwrap();

        assert_eq!(transformed.keys().collect::<Vec<_>>(), vec!["status", "from", "nested"]);
        assert_eq!(transformed.get_document("nested").unwrap(), &doc! { "from": FROM });
    }

    #[test]
    fn where_operand_is_passed_through() {
        let filter = doc! { "$where": "this.from == this.to" };

        assert_eq!(transform_document(&config(), filter.clone()).unwrap(), filter);
    }

    #[test]
    fn coercion_errors_propagate_from_nested_positions() {
        let filter = doc! { "$or": [{ "from": "nope" }] };

        assert!(matches!(
            transform_document(&config(), filter),
            Err(RepositoryError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn transforms_batches() {
        let batch = vec![doc! { "from": FROM }, doc! { "to": TO }];

        assert_eq!(
            transform_documents(&config(), batch).unwrap(),
            vec![doc! { "from": oid(FROM) }, doc! { "to": oid(TO) }]
        );
    }

    fn hex_id() -> impl Strategy<Value = Bson> {
        "[0-9a-f]{24}".prop_map(Bson::String)
    }

    fn leaf() -> impl Strategy<Value = (String, Bson)> {
        prop_oneof![
            hex_id().prop_map(|id| ("from".to_string(), id)),
            prop::collection::vec(hex_id(), 0..4).prop_map(|ids| ("users".to_string(), Bson::Array(ids))),
            hex_id().prop_map(|id| ("to".to_string(), Bson::Document(doc! { "$ne": id }))),
            (0i64..4_000_000_000_000).prop_map(|ms| {
                let date = DateTime::from_millis(ms).try_to_rfc3339_string().unwrap();
                ("date".to_string(), Bson::String(date))
            }),
            "[a-z]{0,8}".prop_map(|s| ("status".to_string(), Bson::String(s))),
        ]
    }

    fn filter() -> impl Strategy<Value = Document> {
        let level = prop::collection::vec(leaf(), 0..5).prop_map(Document::from_iter);

        level.prop_recursive(3, 24, 4, |inner| {
            (
                prop::collection::vec(inner.clone(), 1..3),
                prop::sample::select(vec!["$or", "$and", "$nor"]),
                inner,
            )
                .prop_map(|(branches, op, mut base)| {
                    base.insert(op, branches.into_iter().map(Bson::Document).collect::<Vec<_>>());
                    base
                })
        })
    }

    proptest! {
        #[test]
        fn transform_is_idempotent(document in filter()) {
            let once = transform_document(&config(), document).unwrap();
            let twice = transform_document(&config(), once.clone()).unwrap();

            prop_assert_eq!(once, twice);
        }
    }
}
