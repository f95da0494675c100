//! Temporal operators and the GML time objects they compare against.

use serde::Serialize;

use super::node::{self, Node};
use super::Expression;
use crate::error::{FesError, Result};
use crate::validators::validate_time_position;

operator_names! {
    TemporalOperatorName {
        After => "After",
        Before => "Before",
        Begins => "Begins",
        BegunBy => "BegunBy",
        TContains => "TContains",
        During => "During",
        TEquals => "TEquals",
        TOverlaps => "TOverlaps",
        Meets => "Meets",
        OverlappedBy => "OverlappedBy",
        MetBy => "MetBy",
        EndedBy => "EndedBy",
        AnyInteracts => "AnyInteracts",
    }
}

/// `gml:TimeInstant` or `gml:TimePeriod`, positions kept as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemporalObject {
    Instant {
        id: Option<String>,
        position: String,
    },
    Period {
        id: Option<String>,
        begin: String,
        end: String,
    },
}

impl TemporalObject {
    pub fn instant(position: impl Into<String>) -> Result<Self> {
        let position = position.into();
        validate_time_position(&position)?;
        Ok(TemporalObject::Instant { id: None, position })
    }

    pub fn period(begin: impl Into<String>, end: impl Into<String>) -> Result<Self> {
        let begin = begin.into();
        let end = end.into();
        validate_time_position(&begin)?;
        validate_time_position(&end)?;
        Ok(TemporalObject::Period {
            id: None,
            begin,
            end,
        })
    }

    pub fn with_id(self, new_id: impl Into<String>) -> Self {
        match self {
            TemporalObject::Instant { position, .. } => TemporalObject::Instant {
                id: Some(new_id.into()),
                position,
            },
            TemporalObject::Period { begin, end, .. } => TemporalObject::Period {
                id: Some(new_id.into()),
                begin,
                end,
            },
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            TemporalObject::Instant { id, .. } | TemporalObject::Period { id, .. } => id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemporalOperand {
    Expression(Expression),
    Object(TemporalObject),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalOperator {
    pub operator_type: TemporalOperatorName,
    pub first_operand: Expression,
    second_operand: TemporalOperand,
}

impl TemporalOperator {
    pub fn new(
        operator_type: TemporalOperatorName,
        first_operand: impl Into<Node>,
        second_operand: impl Into<Node>,
    ) -> Result<Self> {
        Ok(Self {
            operator_type,
            first_operand: node::expect_expression(first_operand.into())?,
            second_operand: expect_temporal_operand(second_operand.into())?,
        })
    }

    pub fn second_operand(&self) -> &TemporalOperand {
        &self.second_operand
    }
}

/// Raw values are read as a time instant; one that is not a valid time
/// position is an invalid operator.
fn expect_temporal_operand(node: Node) -> Result<TemporalOperand> {
    match node {
        Node::Expression(expression) => Ok(TemporalOperand::Expression(expression)),
        Node::Temporal(object) => Ok(TemporalOperand::Object(object)),
        Node::Value(value) => TemporalObject::instant(value.to_string())
            .map(TemporalOperand::Object)
            .map_err(|err| FesError::InvalidOperator(err.to_string())),
        other => Err(FesError::InvalidExpression(format!(
            "temporal operand must be an expression or a GML time object, got {:?}",
            other.kind()
        ))),
    }
}
