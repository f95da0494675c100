//! The filter root and its single predicate.

use serde::Serialize;

use super::node::Node;
use super::Operator;
use crate::error::{FesError, Result};

/// Root of a filter: exactly one top-level predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    predicate: Operator,
}

impl Filter {
    pub fn new(predicate: impl Into<Node>) -> Result<Self> {
        match predicate.into() {
            Node::Operator(predicate) => Ok(Self { predicate }),
            other => Err(FesError::InvalidOperator(format!(
                "a filter wraps an operator, got {:?}",
                other.kind()
            ))),
        }
    }

    pub fn predicate(&self) -> &Operator {
        &self.predicate
    }

    pub fn into_predicate(self) -> Operator {
        self.predicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinaryComparisonName, BinaryComparisonOperator, Literal, ValueReference};

    #[test]
    fn wraps_an_operator() {
        let operator = BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsGreaterThan,
            ValueReference::new("name").unwrap(),
            Literal::new("dummy"),
        )
        .unwrap();
        let filter = Filter::new(operator.clone()).unwrap();
        assert_eq!(filter.predicate(), &Operator::from(operator));
    }

    #[test]
    fn rejects_anything_else() {
        assert!(matches!(
            Filter::new(Literal::new("dummy")),
            Err(FesError::InvalidOperator(_))
        ));
        assert!(matches!(Filter::new("text"), Err(FesError::InvalidOperator(_))));
    }
}
