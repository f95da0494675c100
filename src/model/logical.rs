//! Logical operators over predicates.

use serde::Serialize;

use super::node::{self, Node};
use super::{Expression, Operator};
use crate::error::{FesError, Result};

operator_names! {
    BinaryLogicType {
        And => "And",
        Or => "Or",
    }
}

operator_names! {
    UnaryLogicType {
        Not => "Not",
    }
}

/// Operand of a logical operator: an expression or a non-id operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    Expression(Expression),
    Operator(Box<Operator>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryLogicOperator {
    pub operator_type: BinaryLogicType,
    first_predicate: Predicate,
    second_predicate: Predicate,
    extra_predicates: Vec<Predicate>,
}

impl BinaryLogicOperator {
    pub fn new(
        operator_type: BinaryLogicType,
        first_predicate: impl Into<Node>,
        second_predicate: impl Into<Node>,
    ) -> Result<Self> {
        Ok(Self {
            operator_type,
            first_predicate: node::expect_predicate(first_predicate.into())?,
            second_predicate: node::expect_predicate(second_predicate.into())?,
            extra_predicates: Vec::new(),
        })
    }

    pub fn and(first: impl Into<Node>, second: impl Into<Node>) -> Result<Self> {
        Self::new(BinaryLogicType::And, first, second)
    }

    pub fn or(first: impl Into<Node>, second: impl Into<Node>) -> Result<Self> {
        Self::new(BinaryLogicType::Or, first, second)
    }

    /// Combine two or more operands; fewer than two is an error.
    pub fn from_operands<I, N>(operator_type: BinaryLogicType, operands: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let mut operands = operands.into_iter();
        let (Some(first), Some(second)) = (operands.next(), operands.next()) else {
            return Err(FesError::InvalidOperator(format!(
                "{operator_type} needs at least two operands"
            )));
        };
        Self::new(operator_type, first, second)?.with_extra_predicates(operands)
    }

    pub fn with_extra_predicates<I, N>(mut self, predicates: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        for predicate in predicates {
            self.extra_predicates
                .push(node::expect_predicate(predicate.into())?);
        }
        Ok(self)
    }

    pub fn first_predicate(&self) -> &Predicate {
        &self.first_predicate
    }

    pub fn second_predicate(&self) -> &Predicate {
        &self.second_predicate
    }

    pub fn extra_predicates(&self) -> &[Predicate] {
        &self.extra_predicates
    }

    /// All operands in document order.
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        [&self.first_predicate, &self.second_predicate]
            .into_iter()
            .chain(self.extra_predicates.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnaryLogicOperator {
    pub operator_type: UnaryLogicType,
    operand: Predicate,
}

impl UnaryLogicOperator {
    pub fn new(operator_type: UnaryLogicType, operand: impl Into<Node>) -> Result<Self> {
        Ok(Self {
            operator_type,
            operand: node::expect_predicate(operand.into())?,
        })
    }

    pub fn not(operand: impl Into<Node>) -> Result<Self> {
        Self::new(UnaryLogicType::Not, operand)
    }

    pub fn operand(&self) -> &Predicate {
        &self.operand
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LogicalOperator {
    Binary(BinaryLogicOperator),
    Unary(UnaryLogicOperator),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinaryComparisonName, BinaryComparisonOperator, Literal, ResourceId, ValueReference};

    fn less_than(value: i64) -> BinaryComparisonOperator {
        BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsLessThan,
            ValueReference::new("depth").unwrap(),
            Literal::new(value),
        )
        .unwrap()
    }

    #[test]
    fn operands_may_be_operators_or_expressions() {
        let and = BinaryLogicOperator::and(less_than(1), Literal::new(true)).unwrap();
        assert!(matches!(and.first_predicate(), Predicate::Operator(_)));
        assert!(matches!(and.second_predicate(), Predicate::Expression(_)));
        assert!(and.extra_predicates().is_empty());
    }

    #[test]
    fn identifier_operators_are_rejected() {
        let rid = ResourceId::new("road.1").unwrap();
        assert!(matches!(
            UnaryLogicOperator::not(rid),
            Err(FesError::InvalidExpression(_))
        ));
        assert!(matches!(
            BinaryLogicOperator::or("text", less_than(1)),
            Err(FesError::InvalidExpression(_))
        ));
    }

    #[test]
    fn from_operands_keeps_the_remainder_as_extras() {
        let or = BinaryLogicOperator::from_operands(
            BinaryLogicType::Or,
            [less_than(1), less_than(2), less_than(3), less_than(4)],
        )
        .unwrap();
        assert_eq!(or.extra_predicates().len(), 2);
        assert_eq!(or.predicates().count(), 4);

        assert!(matches!(
            BinaryLogicOperator::from_operands(BinaryLogicType::And, [less_than(1)]),
            Err(FesError::InvalidOperator(_))
        ));
    }
}
