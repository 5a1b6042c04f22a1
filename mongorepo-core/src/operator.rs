//! The closed set of query and update operators the transform engine recognises.
//!
//! Adding an operator means adding a variant here and listing it in [`Operator::ALL`];
//! nothing else in the crate matches on operator strings.

use std::fmt;

/// How the transform engine treats an operator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Compares a field against an operand (`{ field: { $gt: value } }`). Operands of
    /// comparison operators under a transform field are coerced.
    Comparison,
    /// Wraps one or more documents (`$set`, `$or`, ...). The engine recurses into the operand.
    Structural,
    /// Names fields to drop (`$unset`). The operand's values are placeholders and pass through as-is.
    Removal,
}

/// A recognised operator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Set,
    SetOnInsert,
    Unset,
    Push,
    AddToSet,
    Pull,
    And,
    Or,
    Nor,
    Where,
}

impl Operator {
    /// Every recognised operator.
    pub const ALL: [Operator; 18] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::In,
        Operator::Nin,
        Operator::Set,
        Operator::SetOnInsert,
        Operator::Unset,
        Operator::Push,
        Operator::AddToSet,
        Operator::Pull,
        Operator::And,
        Operator::Or,
        Operator::Nor,
        Operator::Where,
    ];

    /// Looks up the operator spelled `key`, including its `$` prefix.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == key)
    }

    /// The operator's key as it appears in a document.
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Set => "$set",
            Operator::SetOnInsert => "$setOnInsert",
            Operator::Unset => "$unset",
            Operator::Push => "$push",
            Operator::AddToSet => "$addToSet",
            Operator::Pull => "$pull",
            Operator::And => "$and",
            Operator::Or => "$or",
            Operator::Nor => "$nor",
            Operator::Where => "$where",
        }
    }

    pub const fn kind(self) -> OperatorKind {
        match self {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte
            | Operator::In
            | Operator::Nin => OperatorKind::Comparison,
            Operator::Unset => OperatorKind::Removal,
            _ => OperatorKind::Structural,
        }
    }

    /// Whether `key` names a comparison operator.
    pub fn is_comparison(key: &str) -> bool {
        Self::from_key(key).is_some_and(|op| op.kind() == OperatorKind::Comparison)
    }

    /// Whether `key` names a structural or logical operator.
    pub fn is_structural(key: &str) -> bool {
        Self::from_key(key).is_some_and(|op| op.kind() == OperatorKind::Structural)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_key(op.as_str()), Some(op));
        }
    }

    #[test]
    fn classification() {
        assert!(Operator::is_comparison("$in"));
        assert!(!Operator::is_comparison("$set"));
        assert!(Operator::is_structural("$setOnInsert"));
        assert!(Operator::is_structural("$or"));
        assert!(!Operator::is_structural("$eq"));
        assert!(!Operator::is_structural("$unset"));
        assert_eq!(Operator::Unset.kind(), OperatorKind::Removal);
        assert!(Operator::from_key("$regex").is_none());
        assert!(Operator::from_key("set").is_none());
    }
}
