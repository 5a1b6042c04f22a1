//! Optional validation of documents before they are written.
//!
//! A repository can carry a [`DocumentValidator`]. When present, every document handed
//! to `insert_one`/`insert_many` is checked in its raw, caller-supplied form before any
//! transform is applied.

use bson::{Bson, Document};
use std::{fmt, sync::Arc};

use crate::error::{RepositoryError, RepositoryResult};

/// Strategy for validating documents before they reach the store.
pub trait DocumentValidator: Send + Sync {
    /// Checks `document`, returning [`RepositoryError::Validation`] when it is rejected.
    fn validate(&self, document: &Document) -> RepositoryResult<()>;
}

impl<V: DocumentValidator + ?Sized> DocumentValidator for Arc<V> {
    fn validate(&self, document: &Document) -> RepositoryResult<()> {
        (**self).validate(document)
    }
}

/// Adapts a closure into a [`DocumentValidator`].
///
/// The closure returns a human readable reason on rejection.
///
/// ```ignore
/// let validator = FnValidator::new(|doc: &Document| {
///     doc.contains_key("name").then_some(()).ok_or_else(|| "name is required".to_string())
/// });
/// ```
pub struct FnValidator<F> {
    check: F,
}

impl<F> FnValidator<F>
where
    F: Fn(&Document) -> Result<(), String> + Send + Sync,
{
    pub fn new(check: F) -> Self {
        Self { check }
    }
}

impl<F> DocumentValidator for FnValidator<F>
where
    F: Fn(&Document) -> Result<(), String> + Send + Sync,
{
    fn validate(&self, document: &Document) -> RepositoryResult<()> {
        (self.check)(document).map_err(RepositoryError::Validation)
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").finish_non_exhaustive()
    }
}

/// Rejects documents missing any of a fixed set of fields, or holding `null` in them.
#[derive(Debug, Clone, Default)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { fields: fields.into_iter().map(Into::into).collect() }
    }
}

impl DocumentValidator for RequiredFields {
    fn validate(&self, document: &Document) -> RepositoryResult<()> {
        let missing = self
            .fields
            .iter()
            .filter(|field| matches!(document.get(field.as_str()), None | Some(Bson::Null)))
            .map(String::as_str)
            .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn required_fields() {
        let validator = RequiredFields::new(["name", "status"]);

        assert!(validator.validate(&doc! { "name": "a", "status": "PENDING" }).is_ok());

        match validator.validate(&doc! { "name": "a", "status": null }) {
            Err(RepositoryError::Validation(reason)) => assert_eq!(reason, "missing required fields: status"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn closure_validator() {
        let validator = FnValidator::new(|doc: &Document| {
            if doc.get_str("status").is_ok_and(|s| s == "PENDING") {
                Ok(())
            } else {
                Err("status must be PENDING".to_string())
            }
        });

        assert!(validator.validate(&doc! { "status": "PENDING" }).is_ok());
        assert!(matches!(
            validator.validate(&doc! { "status": "FAILED" }),
            Err(RepositoryError::Validation(_))
        ));
    }
}
