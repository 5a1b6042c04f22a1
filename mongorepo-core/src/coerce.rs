//! Value coercion for transform fields.
//!
//! Only strings are converted. Every other scalar (including values that were already
//! coerced) passes through untouched, which makes coercion safe to apply twice.

use bson::{Bson, DateTime, oid::ObjectId};
use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    config::{EntityConfig, TransformKind},
    error::{RepositoryError, RepositoryResult},
};

/// Naive layouts accepted for timestamp fields, read as UTC.
const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Coerces `raw` according to the kind declared for `field` in `config`.
///
/// Fields without a declared kind are returned unchanged. Arrays are coerced
/// element-wise, preserving order and length.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidIdentifier`] or [`RepositoryError::InvalidTimestamp`]
/// when a string cannot be converted.
pub fn coerce(config: &EntityConfig, field: &str, raw: Bson) -> RepositoryResult<Bson> {
    match config.transform_kind(field) {
        Some(kind) => coerce_as(kind, field, raw),
        None => Ok(raw),
    }
}

/// Coerces `raw` to `kind`. `field` is only used for error reporting.
pub fn coerce_as(kind: TransformKind, field: &str, raw: Bson) -> RepositoryResult<Bson> {
    match raw {
        Bson::String(value) => coerce_str(kind, field, &value),
        Bson::Array(values) => Ok(Bson::Array(
            values
                .into_iter()
                .map(|value| coerce_as(kind, field, value))
                .collect::<RepositoryResult<Vec<_>>>()?,
        )),
        other => Ok(other),
    }
}

fn coerce_str(kind: TransformKind, field: &str, value: &str) -> RepositoryResult<Bson> {
    match kind {
        TransformKind::ObjectId => ObjectId::parse_str(value)
            .map(Bson::ObjectId)
            .map_err(|_| RepositoryError::InvalidIdentifier {
                field: field.to_string(),
                value: value.to_string(),
            }),
        TransformKind::Timestamp => parse_timestamp(value)
            .map(Bson::DateTime)
            .ok_or_else(|| RepositoryError::InvalidTimestamp {
                field: field.to_string(),
                value: value.to_string(),
            }),
    }
}

/// Parses an ISO-8601-like timestamp.
///
/// RFC 3339 strings keep their offset. Date-times without an offset and bare dates are
/// taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime> {
    let value = value.trim();

    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(DateTime::from_millis(parsed.timestamp_millis()));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| DateTime::from_millis(naive.and_utc().timestamp_millis()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::bson;

    const ID: &str = "6527b103bce59986d40b0657";

    fn config() -> EntityConfig {
        EntityConfig::builder("Transactions")
            .transform("from", TransformKind::ObjectId)
            .transform("date", TransformKind::Timestamp)
            .build()
    }

    #[test]
    fn identifier_round_trips_to_hex() {
        let coerced = coerce(&config(), "from", Bson::String(ID.into())).unwrap();

        match coerced {
            Bson::ObjectId(oid) => assert_eq!(oid.to_hex(), ID),
            other => panic!("expected ObjectId, got {other:?}"),
        }
    }

    #[test]
    fn invalid_identifier_is_rejected() {
        let err = coerce(&config(), "from", Bson::String("not-an-id".into())).unwrap_err();

        match err {
            RepositoryError::InvalidIdentifier { field, value } => {
                assert_eq!(field, "from");
                assert_eq!(value, "not-an-id");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn timestamp_forms() {
        let expected = DateTime::from_millis(1_696_291_200_000);

        for raw in [
            "2023-10-03T00:00:00Z",
            "2023-10-03T00:00:00.000Z",
            "2023-10-03T08:00:00+08:00",
            "2023-10-03 00:00",
            "2023-10-03T00:00",
            "2023-10-03 00:00:00",
            "2023-10-03",
        ] {
            assert_eq!(
                coerce(&config(), "date", Bson::String(raw.into())).unwrap(),
                Bson::DateTime(expected),
                "{raw}"
            );
        }
    }

    #[test]
    fn invalid_timestamp_is_rejected() {
        assert!(matches!(
            coerce(&config(), "date", Bson::String("yesterday".into())),
            Err(RepositoryError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn arrays_are_coerced_element_wise() {
        let other = "6527b103bce59986d40b0658";
        let coerced = coerce(&config(), "from", bson!([ID, other])).unwrap();

        assert_eq!(
            coerced,
            bson!([ObjectId::parse_str(ID).unwrap(), ObjectId::parse_str(other).unwrap()])
        );
    }

    #[test]
    fn undeclared_field_is_identity() {
        let raw = Bson::String("not-an-id".into());

        assert_eq!(coerce(&config(), "status", raw.clone()).unwrap(), raw);
    }

    #[test]
    fn coerced_values_pass_through() {
        let oid = Bson::ObjectId(ObjectId::parse_str(ID).unwrap());
        let date = Bson::DateTime(DateTime::from_millis(0));

        assert_eq!(coerce(&config(), "from", oid.clone()).unwrap(), oid);
        assert_eq!(coerce(&config(), "date", date.clone()).unwrap(), date);
        assert_eq!(coerce(&config(), "from", Bson::Null).unwrap(), Bson::Null);
    }
}
