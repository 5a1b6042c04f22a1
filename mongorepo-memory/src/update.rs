//! Update document application.

use bson::{Bson, Document};

use mongorepo_core::error::{RepositoryError, RepositoryResult};

use crate::evaluator::{Comparable, condition_matches, get_path, is_operator_document};

/// Applies `update` to `document` in place.
///
/// An update without operator keys replaces every field except `_id`. `inserting` is set
/// while building an upserted document, which is when `$setOnInsert` takes effect.
pub(crate) fn apply_update(
    document: &mut Document,
    update: &Document,
    inserting: bool,
) -> RepositoryResult<()> {
    if !update.keys().any(|key| key.starts_with('$')) {
        let id = document.get("_id").cloned();
        document.clear();
        if let Some(id) = id {
            document.insert("_id", id);
        }
        for (key, value) in update {
            if key != "_id" || !document.contains_key("_id") {
                document.insert(key.clone(), value.clone());
            }
        }
        return Ok(());
    }

    for (op, fields) in update {
        let fields = fields.as_document().ok_or_else(|| {
            RepositoryError::Backend(format!("{op} needs a document of fields"))
        })?;

        for (path, value) in fields {
            match op.as_str() {
                "$set" => set_path(document, path, value.clone())?,
                "$setOnInsert" => {
                    if inserting {
                        set_path(document, path, value.clone())?;
                    }
                }
                "$unset" => unset_path(document, path),
                "$inc" => increment(document, path, value)?,
                "$push" => push(document, path, value, false)?,
                "$addToSet" => push(document, path, value, true)?,
                "$pull" => pull(document, path, value)?,
                other => {
                    return Err(RepositoryError::Backend(format!(
                        "unsupported update operator {other}"
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Seeds an upserted document from the equality conditions of `filter`.
pub(crate) fn seed_from_filter(filter: &Document) -> RepositoryResult<Document> {
    let mut seed = Document::new();

    for (key, condition) in filter {
        if key.starts_with('$') {
            continue;
        }
        match condition {
            Bson::Document(doc) if is_operator_document(doc) => {
                if let Some(value) = doc.get("$eq") {
                    set_path(&mut seed, key, value.clone())?;
                }
            }
            value => set_path(&mut seed, key, value.clone())?,
        }
    }

    Ok(seed)
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> RepositoryResult<()> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(Document::new()));

            match child {
                Bson::Document(child) => set_path(child, rest, value),
                _ => Err(RepositoryError::Backend(format!(
                    "cannot create field {rest} inside non-document {head}"
                ))),
            }
        }
    }
}

fn unset_path(document: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            document.remove(path);
        }
        Some((head, rest)) => {
            if let Ok(child) = document.get_document_mut(head) {
                unset_path(child, rest);
            }
        }
    }
}

fn get_path_mut<'a>(document: &'a mut Document, path: &str) -> Option<&'a mut Bson> {
    match path.split_once('.') {
        None => document.get_mut(path),
        Some((head, rest)) => get_path_mut(document.get_document_mut(head).ok()?, rest),
    }
}

fn increment(document: &mut Document, path: &str, by: &Bson) -> RepositoryResult<()> {
    let current = get_path(document, path).cloned().unwrap_or(Bson::Int32(0));

    let overflow = || RepositoryError::Backend(format!("$inc overflows field {path}"));
    let sum = match (&current, by) {
        (Bson::Int32(a), Bson::Int32(b)) => a
            .checked_add(*b)
            .map(Bson::Int32)
            .unwrap_or(Bson::Int64(i64::from(*a) + i64::from(*b))),
        (Bson::Int32(a), Bson::Int64(b)) => {
            Bson::Int64(i64::from(*a).checked_add(*b).ok_or_else(overflow)?)
        }
        (Bson::Int64(a), Bson::Int32(b)) => {
            Bson::Int64(a.checked_add(i64::from(*b)).ok_or_else(overflow)?)
        }
        (Bson::Int64(a), Bson::Int64(b)) => Bson::Int64(a.checked_add(*b).ok_or_else(overflow)?),
        (a, b) => match (Comparable::from(a), Comparable::from(b)) {
            (Comparable::Number(a), Comparable::Number(b)) => Bson::Double(a + b),
            _ => {
                return Err(RepositoryError::Backend(format!(
                    "cannot apply $inc to non-numeric field {path}"
                )));
            }
        },
    };

    set_path(document, path, sum)
}

fn push(document: &mut Document, path: &str, value: &Bson, unique: bool) -> RepositoryResult<()> {
    let values = match value {
        Bson::Document(modifier) if modifier.contains_key("$each") => modifier
            .get_array("$each")
            .map_err(|_| RepositoryError::Backend("$each needs an array".into()))?
            .clone(),
        value => vec![value.clone()],
    };

    if get_path(document, path).is_none() {
        set_path(document, path, Bson::Array(Vec::new()))?;
    }

    let Some(Bson::Array(items)) = get_path_mut(document, path) else {
        return Err(RepositoryError::Backend(format!(
            "cannot push to non-array field {path}"
        )));
    };

    for value in values {
        let present = items
            .iter()
            .any(|item| Comparable::from(item) == Comparable::from(&value));
        if !unique || !present {
            items.push(value);
        }
    }

    Ok(())
}

fn pull(document: &mut Document, path: &str, condition: &Bson) -> RepositoryResult<()> {
    let Some(Bson::Array(items)) = get_path_mut(document, path) else {
        return Ok(());
    };

    let mut kept = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !condition_matches(Some(&item), condition)? {
            kept.push(item);
        }
    }
    *items = kept;

    Ok(())
}
