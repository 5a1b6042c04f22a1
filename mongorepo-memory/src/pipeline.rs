//! Aggregation pipeline execution over in-memory collections.
//!
//! Supported stages are `$match`, `$sort`, `$skip`, `$limit`, `$lookup` and `$unwind`.

use bson::{Bson, Document};
use std::cmp::Ordering;

use mongorepo_core::error::{RepositoryError, RepositoryResult};

use crate::{
    evaluator::{Comparable, filter_documents, get_path, sort_order, truthy, values_equal},
    store::StoreMap,
};

/// Runs `pipeline` against `collection`, reading joined collections from `store`.
pub(crate) fn run_pipeline(
    store: &StoreMap,
    collection: &str,
    pipeline: &[Document],
) -> RepositoryResult<Vec<Document>> {
    let mut rows: Vec<Document> = store.get(collection).cloned().unwrap_or_default();

    for stage in pipeline {
        let (name, spec) = match stage.iter().next() {
            Some(entry) if stage.len() == 1 => entry,
            _ => {
                return Err(RepositoryError::Backend(
                    "pipeline stages must have exactly one key".into(),
                ));
            }
        };

        rows = match name.as_str() {
            "$match" => filter_documents(rows.iter(), stage_document(name, spec)?)?,
            "$sort" => {
                sort_documents(&mut rows, stage_document(name, spec)?);
                rows
            }
            "$skip" => rows.into_iter().skip(count(name, spec)?).collect(),
            "$limit" => rows.into_iter().take(count(name, spec)?).collect(),
            "$lookup" => lookup(store, rows, stage_document(name, spec)?)?,
            "$unwind" => unwind(rows, spec)?,
            other => {
                return Err(RepositoryError::Backend(format!(
                    "unsupported pipeline stage {other}"
                )));
            }
        };
    }

    Ok(rows)
}

fn stage_document<'a>(name: &str, spec: &'a Bson) -> RepositoryResult<&'a Document> {
    spec.as_document()
        .ok_or_else(|| RepositoryError::Backend(format!("{name} needs a document")))
}

fn count(name: &str, spec: &Bson) -> RepositoryResult<usize> {
    let value = match spec {
        Bson::Int32(n) => *n as i64,
        Bson::Int64(n) => *n,
        Bson::Double(n) if n.fract() == 0.0 => *n as i64,
        _ => return Err(RepositoryError::Backend(format!("{name} needs an integer"))),
    };

    usize::try_from(value)
        .map_err(|_| RepositoryError::Backend(format!("{name} must not be negative")))
}

/// Orders two documents by each key of `sort` in turn; negative directions sort
/// descending.
pub(crate) fn compare_by(sort: &Document, a: &Document, b: &Document) -> Ordering {
    sort.iter().fold(Ordering::Equal, |order, (field, direction)| {
        order.then_with(|| {
            let ordering = sort_order(get_path(a, field), get_path(b, field));
            match Comparable::from(direction) {
                Comparable::Number(n) if n < 0.0 => ordering.reverse(),
                _ => ordering,
            }
        })
    })
}

pub(crate) fn sort_documents(rows: &mut [Document], sort: &Document) {
    rows.sort_by(|a, b| compare_by(sort, a, b));
}

fn lookup(store: &StoreMap, rows: Vec<Document>, spec: &Document) -> RepositoryResult<Vec<Document>> {
    let field = |key: &str| {
        spec.get_str(key)
            .map_err(|_| RepositoryError::Backend(format!("$lookup needs a string {key}")))
    };
    let (from, local_field, foreign_field, as_field) =
        (field("from")?, field("localField")?, field("foreignField")?, field("as")?);

    let foreign = store.get(from).map(Vec::as_slice).unwrap_or_default();

    Ok(rows
        .into_iter()
        .map(|mut row| {
            let local = get_path(&row, local_field).cloned().unwrap_or(Bson::Null);
            let candidates = match &local {
                Bson::Array(items) if !items.is_empty() => items.clone(),
                value => vec![value.clone()],
            };

            let joined = foreign
                .iter()
                .filter(|doc| {
                    let value = get_path(doc, foreign_field);
                    candidates.iter().any(|candidate| values_equal(value, candidate))
                })
                .cloned()
                .map(Bson::Document)
                .collect();

            row.insert(as_field, Bson::Array(joined));
            row
        })
        .collect())
}

fn unwind(rows: Vec<Document>, spec: &Bson) -> RepositoryResult<Vec<Document>> {
    let (path, preserve) = match spec {
        Bson::String(path) => (path.as_str(), false),
        Bson::Document(options) => (
            options
                .get_str("path")
                .map_err(|_| RepositoryError::Backend("$unwind needs a path".into()))?,
            options
                .get("preserveNullAndEmptyArrays")
                .is_some_and(truthy),
        ),
        _ => return Err(RepositoryError::Backend("$unwind needs a path".into())),
    };
    let field = path.strip_prefix('$').ok_or_else(|| {
        RepositoryError::Backend(format!("$unwind path {path} must start with '$'"))
    })?;

    let mut unwound = Vec::with_capacity(rows.len());

    for mut row in rows {
        match row.get(field).cloned() {
            Some(Bson::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut copy = row.clone();
                    copy.insert(field, item);
                    unwound.push(copy);
                }
            }
            Some(Bson::Array(_)) => {
                if preserve {
                    row.remove(field);
                    unwound.push(row);
                }
            }
            None | Some(Bson::Null) => {
                if preserve {
                    unwound.push(row);
                }
            }
            Some(_) => unwound.push(row),
        }
    }

    Ok(unwound)
}
