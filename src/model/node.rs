//! Anything that can be offered to a slot of the filter tree.
//!
//! Constructors accept `impl Into<Node>` and check the node's kind against
//! the kinds the slot permits before anything is assigned.

use serde::Serialize;
use std::collections::BTreeMap;

use super::{
    Boundary, Expression, Filter, Function, Geometry, Literal, Operator, Predicate,
    TemporalObject, Value, ValueReference,
};
use crate::error::{FesError, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Node {
    Expression(Expression),
    Operator(Operator),
    Boundary(Boundary),
    Geometry(Geometry),
    Temporal(TemporalObject),
    Filter(Filter),
    Value(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    ValueReference,
    Literal,
    Function,
    ComparisonOperator,
    SpatialOperator,
    TemporalOperator,
    LogicalOperator,
    IdentifierOperator,
    Boundary,
    Geometry,
    TemporalObject,
    Filter,
    Value,
}

impl NodeKind {
    pub const EXPRESSIONS: &'static [NodeKind] =
        &[NodeKind::ValueReference, NodeKind::Literal, NodeKind::Function];

    /// Operands of logical operators: expressions and non-id operators.
    pub const PREDICATES: &'static [NodeKind] = &[
        NodeKind::ValueReference,
        NodeKind::Literal,
        NodeKind::Function,
        NodeKind::ComparisonOperator,
        NodeKind::SpatialOperator,
        NodeKind::TemporalOperator,
        NodeKind::LogicalOperator,
    ];
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Expression(Expression::ValueReference(_)) => NodeKind::ValueReference,
            Node::Expression(Expression::Literal(_)) => NodeKind::Literal,
            Node::Expression(Expression::Function(_)) => NodeKind::Function,
            Node::Operator(Operator::Comparison(_)) => NodeKind::ComparisonOperator,
            Node::Operator(Operator::Spatial(_)) => NodeKind::SpatialOperator,
            Node::Operator(Operator::Temporal(_)) => NodeKind::TemporalOperator,
            Node::Operator(Operator::Logical(_)) => NodeKind::LogicalOperator,
            Node::Operator(Operator::Identifier(_)) => NodeKind::IdentifierOperator,
            Node::Boundary(_) => NodeKind::Boundary,
            Node::Geometry(_) => NodeKind::Geometry,
            Node::Temporal(_) => NodeKind::TemporalObject,
            Node::Filter(_) => NodeKind::Filter,
            Node::Value(_) => NodeKind::Value,
        }
    }

    fn describe(&self) -> String {
        match self {
            Node::Value(value) => format!("{} value {:?}", value.kind(), value.to_string()),
            other => format!("{:?}", other.kind()),
        }
    }
}

/// Fail with `InvalidExpression` unless `node` is one of `allowed`.
pub fn validate_operand(node: &Node, allowed: &[NodeKind]) -> Result<()> {
    if allowed.contains(&node.kind()) {
        Ok(())
    } else {
        Err(FesError::InvalidExpression(format!(
            "{} is not allowed here (expected one of {:?})",
            node.describe(),
            allowed
        )))
    }
}

pub(crate) fn expect_expression(node: Node) -> Result<Expression> {
    validate_operand(&node, NodeKind::EXPRESSIONS)?;
    match node {
        Node::Expression(expression) => Ok(expression),
        other => Err(FesError::InvalidExpression(other.describe())),
    }
}

pub(crate) fn expect_predicate(node: Node) -> Result<Predicate> {
    validate_operand(&node, NodeKind::PREDICATES)?;
    match node {
        Node::Expression(expression) => Ok(Predicate::Expression(expression)),
        Node::Operator(operator) => Ok(Predicate::Operator(Box::new(operator))),
        other => Err(FesError::InvalidExpression(other.describe())),
    }
}

impl From<Expression> for Node {
    fn from(value: Expression) -> Self {
        Node::Expression(value)
    }
}

impl From<ValueReference> for Node {
    fn from(value: ValueReference) -> Self {
        Node::Expression(Expression::ValueReference(value))
    }
}

impl From<Literal> for Node {
    fn from(value: Literal) -> Self {
        Node::Expression(Expression::Literal(value))
    }
}

impl From<Function> for Node {
    fn from(value: Function) -> Self {
        Node::Expression(Expression::Function(value))
    }
}

impl From<Operator> for Node {
    fn from(value: Operator) -> Self {
        Node::Operator(value)
    }
}

impl From<Predicate> for Node {
    fn from(value: Predicate) -> Self {
        match value {
            Predicate::Expression(expression) => Node::Expression(expression),
            Predicate::Operator(operator) => Node::Operator(*operator),
        }
    }
}

impl From<Boundary> for Node {
    fn from(value: Boundary) -> Self {
        Node::Boundary(value)
    }
}

impl From<Geometry> for Node {
    fn from(value: Geometry) -> Self {
        Node::Geometry(value)
    }
}

impl From<TemporalObject> for Node {
    fn from(value: TemporalObject) -> Self {
        Node::Temporal(value)
    }
}

impl From<Filter> for Node {
    fn from(value: Filter) -> Self {
        Node::Filter(value)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::Value(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Value(value.into())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Value(value.into())
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Value(value.into())
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Value(value.into())
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Value(value.into())
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Value(value.into())
    }
}

impl From<Vec<Value>> for Node {
    fn from(value: Vec<Value>) -> Self {
        Node::Value(Value::List(value))
    }
}

impl From<BTreeMap<String, Value>> for Node {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Node::Value(Value::Map(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions_pass_the_default_guard() {
        let operands: Vec<Node> = vec![
            ValueReference::new("first").unwrap().into(),
            Literal::new("second").into(),
            Function::new("third").unwrap().into(),
        ];
        for operand in &operands {
            assert!(validate_operand(operand, NodeKind::EXPRESSIONS).is_ok());
        }
    }

    #[test]
    fn narrowed_guard_rejects_other_expression_kinds() {
        let cases: Vec<(Node, &[NodeKind])> = vec![
            (
                ValueReference::new("first").unwrap().into(),
                &[NodeKind::Literal, NodeKind::Function],
            ),
            (
                Literal::new("second").into(),
                &[NodeKind::ValueReference, NodeKind::Function],
            ),
            (
                Function::new("third").unwrap().into(),
                &[NodeKind::ValueReference, NodeKind::Literal],
            ),
        ];
        for (operand, allowed) in cases {
            assert!(matches!(
                validate_operand(&operand, allowed),
                Err(FesError::InvalidExpression(_))
            ));
        }
    }

    #[test]
    fn raw_values_are_not_expressions() {
        let err = expect_expression(Node::from("this")).unwrap_err();
        assert!(matches!(err, FesError::InvalidExpression(_)));
        assert!(err.to_string().contains("string value"));
    }
}
