//! Filter tree: expressions, operator families and the `Filter` root.
//!
//! Every operator constructor guards its slots through [`node`], so a tree
//! that exists is a tree whose children have the kinds FES allows.

use serde::Serialize;

use crate::error::{FesError, Result};

/// Closed enumeration of operator names with their FES wire spelling.
/// Parsing an unknown name fails with `InvalidOperator`.
macro_rules! operator_names {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = FesError;

            fn from_str(value: &str) -> Result<Self> {
                match value {
                    $($wire => Ok($name::$variant),)+
                    other => Err(FesError::InvalidOperator(format!(
                        "{other:?} is not a {}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

pub mod comparison;
pub mod expression;
pub mod filter;
pub mod identifier;
pub mod logical;
pub mod node;
pub mod spatial;
pub mod temporal;
pub mod value;

pub use comparison::{
    BetweenComparisonOperator, BinaryComparisonName, BinaryComparisonOperator, Boundary,
    BoundaryKind, ComparisonOperator, LikeOperator, MatchAction, NilOperator, NullOperator,
};
pub use expression::{Expression, Function, Literal, ValueReference};
pub use filter::Filter;
pub use identifier::{ResourceId, Version, VersionAction};
pub use logical::{
    BinaryLogicOperator, BinaryLogicType, LogicalOperator, Predicate, UnaryLogicOperator,
    UnaryLogicType,
};
pub use node::{Node, NodeKind};
pub use spatial::{
    BinarySpatialOperator, Distance, DistanceOperator, DistanceOperatorName, Geometry,
    SpatialDescription, SpatialOperator, SpatialOperatorName,
};
pub use temporal::{TemporalObject, TemporalOperand, TemporalOperator, TemporalOperatorName};
pub use value::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Comparison(ComparisonOperator),
    Spatial(SpatialOperator),
    Temporal(TemporalOperator),
    Logical(LogicalOperator),
    Identifier(ResourceId),
}

impl Operator {
    /// Local name of the fes element encoding this operator.
    pub fn element_name(&self) -> &'static str {
        match self {
            Operator::Comparison(op) => op.element_name(),
            Operator::Spatial(SpatialOperator::Distance(op)) => op.operator_type.as_str(),
            Operator::Spatial(SpatialOperator::Binary(op)) => op.operator_type.as_str(),
            Operator::Temporal(op) => op.operator_type.as_str(),
            Operator::Logical(LogicalOperator::Binary(op)) => op.operator_type.as_str(),
            Operator::Logical(LogicalOperator::Unary(op)) => op.operator_type.as_str(),
            Operator::Identifier(_) => "ResourceId",
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Operator::Identifier(_))
    }
}

macro_rules! into_operator {
    ($($ty:ty => |$v:ident| $wrap:expr;)+) => {
        $(
            impl From<$ty> for Operator {
                fn from($v: $ty) -> Self {
                    $wrap
                }
            }

            impl From<$ty> for Node {
                fn from($v: $ty) -> Self {
                    Node::Operator($wrap)
                }
            }
        )+
    };
}

into_operator! {
    ComparisonOperator => |op| Operator::Comparison(op);
    SpatialOperator => |op| Operator::Spatial(op);
    TemporalOperator => |op| Operator::Temporal(op);
    LogicalOperator => |op| Operator::Logical(op);
    ResourceId => |op| Operator::Identifier(op);
    BinaryComparisonOperator => |op| Operator::Comparison(ComparisonOperator::Binary(op));
    LikeOperator => |op| Operator::Comparison(ComparisonOperator::Like(op));
    BetweenComparisonOperator => |op| Operator::Comparison(ComparisonOperator::Between(op));
    NullOperator => |op| Operator::Comparison(ComparisonOperator::Null(op));
    NilOperator => |op| Operator::Comparison(ComparisonOperator::Nil(op));
    DistanceOperator => |op| Operator::Spatial(SpatialOperator::Distance(op));
    BinarySpatialOperator => |op| Operator::Spatial(SpatialOperator::Binary(op));
    BinaryLogicOperator => |op| Operator::Logical(LogicalOperator::Binary(op));
    UnaryLogicOperator => |op| Operator::Logical(LogicalOperator::Unary(op));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_names_follow_the_operator_type() {
        let vr = || ValueReference::new("depth").unwrap();
        let less = BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsLessThan,
            vr(),
            Literal::new(30),
        )
        .unwrap();
        assert_eq!(Operator::from(less.clone()).element_name(), "PropertyIsLessThan");

        let not = UnaryLogicOperator::not(less).unwrap();
        assert_eq!(Operator::from(not).element_name(), "Not");

        let null = NullOperator::new(vr()).unwrap();
        assert_eq!(Operator::from(null).element_name(), "PropertyIsNull");
    }

    #[test]
    fn operator_names_parse_their_wire_spelling() {
        for name in SpatialOperatorName::ALL {
            assert_eq!(name.as_str().parse::<SpatialOperatorName>().unwrap(), *name);
        }
        assert!(matches!(
            "Touching".parse::<SpatialOperatorName>(),
            Err(FesError::InvalidOperator(_))
        ));
    }
}
