//! Filter evaluation for in-memory documents.
//!
//! Filters use the MongoDB query document syntax: field conditions (plain values or
//! operator documents) combined with `$and`, `$or` and `$nor`.

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use std::{cmp::Ordering, collections::HashMap};

use mongorepo_core::error::{RepositoryError, RepositoryResult};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to `f64`. Values of different kinds never compare equal;
/// their relative order follows the BSON comparison order.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Number(f64),
    String(&'a str),
    Map(HashMap<&'a str, Comparable<'a>>),
    Array(Vec<Comparable<'a>>),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    Other,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Other,
        }
    }
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Map(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::ObjectId(_) => 6,
            Comparable::Bool(_) => 7,
            Comparable::DateTime(_) => 8,
            Comparable::Other => 9,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    /// Orders scalars of the same kind; `None` across kinds and for containers.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Total order used by `$sort`: kind first, then value.
pub(crate) fn sort_order(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    let left = left.map(Comparable::from).unwrap_or(Comparable::Null);
    let right = right.map(Comparable::from).unwrap_or(Comparable::Null);

    left.rank()
        .cmp(&right.rank())
        .then_with(|| left.partial_cmp(&right).unwrap_or(Ordering::Equal))
}

/// Resolves a dotted path through nested documents.
pub(crate) fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Equality with array semantics: an array field matches when it equals the value or
/// any element does. A missing field matches `null`.
pub(crate) fn values_equal(field: Option<&Bson>, value: &Bson) -> bool {
    let expected = Comparable::from(value);

    match field {
        None => expected == Comparable::Null,
        Some(actual @ Bson::Array(items)) => {
            Comparable::from(actual) == expected
                || items.iter().any(|item| Comparable::from(item) == expected)
        }
        Some(actual) => Comparable::from(actual) == expected,
    }
}

fn compare_matches(field: Option<&Bson>, value: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let expected = Comparable::from(value);
    let check = |item: &Bson| {
        let actual = Comparable::from(item);
        actual.rank() == expected.rank() && actual.partial_cmp(&expected).is_some_and(accept)
    };

    match field {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(check),
        Some(actual) => check(actual),
    }
}

fn operand_list<'a>(op: &str, operand: &'a Bson) -> RepositoryResult<&'a Vec<Bson>> {
    operand
        .as_array()
        .ok_or_else(|| RepositoryError::Backend(format!("{op} needs an array")))
}

/// Whether every key of `document` is an operator.
pub(crate) fn is_operator_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|key| key.starts_with('$'))
}

/// Evaluates a field condition against the (possibly missing) field value.
pub(crate) fn condition_matches(field: Option<&Bson>, condition: &Bson) -> RepositoryResult<bool> {
    let operators = match condition {
        Bson::Document(doc) if is_operator_document(doc) => doc,
        value => return Ok(values_equal(field, value)),
    };

    for (op, operand) in operators {
        let matched = match op.as_str() {
            "$eq" => values_equal(field, operand),
            "$ne" => !values_equal(field, operand),
            "$gt" => compare_matches(field, operand, |o| o == Ordering::Greater),
            "$gte" => compare_matches(field, operand, |o| o != Ordering::Less),
            "$lt" => compare_matches(field, operand, |o| o == Ordering::Less),
            "$lte" => compare_matches(field, operand, |o| o != Ordering::Greater),
            "$in" => operand_list(op, operand)?
                .iter()
                .any(|value| values_equal(field, value)),
            "$nin" => !operand_list(op, operand)?
                .iter()
                .any(|value| values_equal(field, value)),
            "$exists" => field.is_some() == truthy(operand),
            "$not" => !condition_matches(field, operand)?,
            other => {
                return Err(RepositoryError::Backend(format!(
                    "unsupported query operator {other}"
                )));
            }
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

pub(crate) fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

/// Evaluates a MongoDB filter document against `document`.
pub(crate) fn matches(document: &Document, filter: &Document) -> RepositoryResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for branch in branches(key, condition)? {
                    if !matches(document, branch)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_branch(document, key, condition)?,
            "$nor" => !any_branch(document, key, condition)?,
            op if op.starts_with('$') => {
                return Err(RepositoryError::Backend(format!(
                    "unsupported top-level operator {op}"
                )));
            }
            path => condition_matches(get_path(document, path), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn any_branch(document: &Document, key: &str, condition: &Bson) -> RepositoryResult<bool> {
    for branch in branches(key, condition)? {
        if matches(document, branch)? {
            return Ok(true);
        }
    }

    Ok(false)
}

fn branches<'a>(key: &str, condition: &'a Bson) -> RepositoryResult<Vec<&'a Document>> {
    operand_list(key, condition)?
        .iter()
        .map(|branch| {
            branch
                .as_document()
                .ok_or_else(|| RepositoryError::Backend(format!("{key} branches must be documents")))
        })
        .collect()
}

/// Keeps the documents matching `filter`.
pub(crate) fn filter_documents<'a>(
    documents: impl IntoIterator<Item = &'a Document>,
    filter: &Document,
) -> RepositoryResult<Vec<Document>> {
    let mut matched = Vec::new();

    for document in documents {
        if matches(document, filter)? {
            matched.push(document.clone());
        }
    }

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn transaction() -> Document {
        doc! {
            "_id": ObjectId::parse_str("6527d349bce59986d40b214a").unwrap(),
            "status": "PENDING",
            "amount": 40,
            "users": ["a", "b"],
            "meta": { "channel": "web" },
            "date": DateTime::from_millis(1_696_291_200_000),
        }
    }

    #[test]
    fn equality_and_arrays() {
        let doc = transaction();

        assert!(matches(&doc, &doc! { "status": "PENDING" }).unwrap());
        assert!(matches(&doc, &doc! { "users": "a" }).unwrap());
        assert!(matches(&doc, &doc! { "users": ["a", "b"] }).unwrap());
        assert!(matches(&doc, &doc! { "meta.channel": "web" }).unwrap());
        assert!(matches(&doc, &doc! { "missing": null }).unwrap());
        assert!(matches(&doc, &doc! { "amount": 40.0 }).unwrap());
        assert!(!matches(&doc, &doc! { "status": "FAILED" }).unwrap());
    }

    #[test]
    fn comparison_operators() {
        let doc = transaction();

        assert!(matches(&doc, &doc! { "amount": { "$gt": 10, "$lte": 40 } }).unwrap());
        assert!(!matches(&doc, &doc! { "amount": { "$gt": "10" } }).unwrap());
        assert!(matches(&doc, &doc! { "date": { "$gte": DateTime::from_millis(0) } }).unwrap());
        assert!(matches(&doc, &doc! { "status": { "$in": ["PENDING", "SUCCESS"] } }).unwrap());
        assert!(matches(&doc, &doc! { "users": { "$nin": ["c"] } }).unwrap());
        assert!(matches(&doc, &doc! { "status": { "$ne": "FAILED" } }).unwrap());
        assert!(matches(&doc, &doc! { "missing": { "$exists": false } }).unwrap());
        assert!(matches(&doc, &doc! { "amount": { "$not": { "$lt": 10 } } }).unwrap());
    }

    #[test]
    fn logical_operators() {
        let doc = transaction();

        assert!(matches(&doc, &doc! { "$or": [{ "status": "FAILED" }, { "amount": 40 }] }).unwrap());
        assert!(!matches(&doc, &doc! { "$and": [{ "status": "PENDING" }, { "amount": 41 }] }).unwrap());
        assert!(matches(&doc, &doc! { "$nor": [{ "status": "FAILED" }] }).unwrap());
    }

    #[test]
    fn unsupported_operators_are_errors() {
        assert!(matches(&transaction(), &doc! { "$where": "true" }).is_err());
        assert!(matches(&transaction(), &doc! { "status": { "$regex": "^P" } }).is_err());
    }

    #[test]
    fn sort_order_brackets_types() {
        assert_eq!(sort_order(None, Some(&Bson::Int32(1))), Ordering::Less);
        assert_eq!(sort_order(Some(&Bson::Int32(2)), Some(&Bson::Double(1.5))), Ordering::Greater);
        assert_eq!(sort_order(Some(&Bson::String("a".into())), Some(&Bson::Int32(9))), Ordering::Greater);
    }
}
