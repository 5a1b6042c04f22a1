//! Join stages for declared lookups and reshaping of populated rows.

use bson::{Bson, Document, doc};
use log::warn;

use crate::config::EntityConfig;

/// Builds the aggregation stages that populate `field`.
///
/// Emits a `$lookup` stage and, for one-to-one lookups, an `$unwind` stage that keeps
/// rows without a match. Returns no stages when `field` has no declared lookup.
pub fn build_stages(config: &EntityConfig, field: &str) -> Vec<Document> {
    let Some(lookup) = config.lookup(field) else {
        return Vec::new();
    };

    let exposed = lookup.exposed_field(field);
    let mut stages = vec![doc! {
        "$lookup": {
            "from": lookup.from_store(),
            "localField": lookup.local_join_field(field),
            "foreignField": lookup.foreign_join_field(),
            "as": exposed,
        }
    }];

    if !lookup.is_array() {
        stages.push(doc! {
            "$unwind": {
                "path": format!("${exposed}"),
                "preserveNullAndEmptyArrays": true,
            }
        });
    }

    stages
}

/// Builds the stages for every field of `populate`, in order.
pub fn build_populate_stages<S: AsRef<str>>(config: &EntityConfig, populate: &[S]) -> Vec<Document> {
    populate
        .iter()
        .flat_map(|field| build_stages(config, field.as_ref()))
        .collect()
}

/// Normalizes the one-to-one fields of a populated row.
///
/// A one-to-one field that is missing from the row, or that still holds an array after
/// unwinding, is set to `null`. One-to-many fields and undeclared fields are untouched.
pub fn reshape_populated<S: AsRef<str>>(config: &EntityConfig, populate: &[S], mut row: Document) -> Document {
    for field in populate {
        let field = field.as_ref();
        let Some(lookup) = config.lookup(field) else {
            continue;
        };
        if lookup.is_array() {
            continue;
        }

        let exposed = lookup.exposed_field(field);
        match row.get(exposed) {
            Some(Bson::Array(matches)) => {
                if matches.len() > 1 {
                    warn!(
                        "{} matches for one-to-one lookup {}.{}; exposing null",
                        matches.len(),
                        config.store_name(),
                        field,
                    );
                }
                row.insert(exposed, Bson::Null);
            }
            Some(_) => {}
            None => {
                row.insert(exposed, Bson::Null);
            }
        }
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LookupDescriptor;

    fn config() -> EntityConfig {
        EntityConfig::builder("Transactions")
            .lookup("from", LookupDescriptor::new("Users").expose_as("pf_from"))
            .lookup("users", LookupDescriptor::new("Users").expose_as("pf_users").array())
            .lookup(
                "code",
                LookupDescriptor::new("Vouchers")
                    .local_field("voucherCode")
                    .foreign_field("code"),
            )
            .build()
    }

    #[test]
    fn one_to_one_lookup_is_unwound() {
        assert_eq!(
            build_stages(&config(), "from"),
            vec![
                doc! { "$lookup": { "from": "Users", "localField": "from", "foreignField": "_id", "as": "pf_from" } },
                doc! { "$unwind": { "path": "$pf_from", "preserveNullAndEmptyArrays": true } },
            ]
        );
    }

    #[test]
    fn one_to_many_lookup_is_not_unwound() {
        assert_eq!(
            build_stages(&config(), "users"),
            vec![doc! { "$lookup": { "from": "Users", "localField": "users", "foreignField": "_id", "as": "pf_users" } }]
        );
    }

    #[test]
    fn explicit_join_keys_and_default_output() {
        assert_eq!(
            build_stages(&config(), "code"),
            vec![
                doc! { "$lookup": { "from": "Vouchers", "localField": "voucherCode", "foreignField": "code", "as": "code" } },
                doc! { "$unwind": { "path": "$code", "preserveNullAndEmptyArrays": true } },
            ]
        );
    }

    #[test]
    fn undeclared_field_has_no_stages() {
        assert!(build_stages(&config(), "status").is_empty());
        assert_eq!(build_populate_stages(&config(), &["status", "users"]).len(), 1);
    }

    #[test]
    fn reshape_one_to_one() {
        let populate = ["from"];

        let missing = reshape_populated(&config(), &populate, doc! { "from": 1 });
        assert_eq!(missing.get("pf_from"), Some(&Bson::Null));

        let empty = reshape_populated(&config(), &populate, doc! { "pf_from": [] });
        assert_eq!(empty.get("pf_from"), Some(&Bson::Null));

        let many = reshape_populated(&config(), &populate, doc! { "pf_from": [{ "a": 1 }, { "a": 2 }] });
        assert_eq!(many.get("pf_from"), Some(&Bson::Null));

        let single = reshape_populated(&config(), &populate, doc! { "pf_from": { "a": 1 } });
        assert_eq!(single, doc! { "pf_from": { "a": 1 } });
    }

    #[test]
    fn reshape_leaves_one_to_many_alone() {
        let row = doc! { "pf_users": [{ "a": 1 }] };

        assert_eq!(reshape_populated(&config(), &["users"], row.clone()), row);
        assert_eq!(reshape_populated(&config(), &["users"], doc! {}), doc! {});
    }
}
