//! Comparison operators (FES 2.0, section 7.7).

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::node::{self, Node};
use super::Expression;
use crate::error::{FesError, Result};

operator_names! {
    BinaryComparisonName {
        PropertyIsEqualTo => "PropertyIsEqualTo",
        PropertyIsNotEqualTo => "PropertyIsNotEqualTo",
        PropertyIsLessThan => "PropertyIsLessThan",
        PropertyIsGreaterThan => "PropertyIsGreaterThan",
        PropertyIsLessThanOrEqualTo => "PropertyIsLessThanOrEqualTo",
        PropertyIsGreaterThanOrEqualTo => "PropertyIsGreaterThanOrEqualTo",
    }
}

/// How multi-valued properties are matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MatchAction {
    All,
    #[default]
    Any,
    One,
}

impl MatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchAction::All => "All",
            MatchAction::Any => "Any",
            MatchAction::One => "One",
        }
    }
}

impl FromStr for MatchAction {
    type Err = FesError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "all" => Ok(MatchAction::All),
            "any" => Ok(MatchAction::Any),
            "one" => Ok(MatchAction::One),
            _ => Err(FesError::InvalidMatchAction(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryComparisonOperator {
    pub operator_type: BinaryComparisonName,
    pub first_expression: Expression,
    pub second_expression: Expression,
    pub match_case: bool,
    pub match_action: MatchAction,
}

impl BinaryComparisonOperator {
    pub fn new(
        operator_type: BinaryComparisonName,
        first_expression: impl Into<Node>,
        second_expression: impl Into<Node>,
    ) -> Result<Self> {
        Ok(Self {
            first_expression: node::expect_expression(first_expression.into())?,
            second_expression: node::expect_expression(second_expression.into())?,
            operator_type,
            match_case: true,
            match_action: MatchAction::Any,
        })
    }

    /// Build from the operator's wire name, e.g. `"PropertyIsEqualTo"`.
    pub fn from_name(
        operator_type: &str,
        first_expression: impl Into<Node>,
        second_expression: impl Into<Node>,
    ) -> Result<Self> {
        // Expressions are checked before the name, as the setters would.
        let mut operator = Self::new(
            BinaryComparisonName::PropertyIsEqualTo,
            first_expression,
            second_expression,
        )?;
        operator.operator_type = operator_type.parse()?;
        Ok(operator)
    }

    pub fn with_match_case(mut self, match_case: bool) -> Self {
        self.match_case = match_case;
        self
    }

    pub fn with_match_action(mut self, match_action: MatchAction) -> Self {
        self.match_action = match_action;
        self
    }

    pub fn set_first_expression(&mut self, expression: impl Into<Node>) -> Result<()> {
        self.first_expression = node::expect_expression(expression.into())?;
        Ok(())
    }

    pub fn set_second_expression(&mut self, expression: impl Into<Node>) -> Result<()> {
        self.second_expression = node::expect_expression(expression.into())?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeOperator {
    pub first_expression: Expression,
    pub second_expression: Expression,
    pub wild_card: String,
    pub single_char: String,
    pub escape_char: String,
}

impl LikeOperator {
    pub fn new(first_expression: impl Into<Node>, second_expression: impl Into<Node>) -> Result<Self> {
        Ok(Self {
            first_expression: node::expect_expression(first_expression.into())?,
            second_expression: node::expect_expression(second_expression.into())?,
            wild_card: String::new(),
            single_char: String::new(),
            escape_char: String::new(),
        })
    }

    pub fn with_pattern_tokens(
        mut self,
        wild_card: impl Into<String>,
        single_char: impl Into<String>,
        escape_char: impl Into<String>,
    ) -> Self {
        self.wild_card = wild_card.into();
        self.single_char = single_char.into();
        self.escape_char = escape_char.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BoundaryKind {
    Lower,
    Upper,
}

impl BoundaryKind {
    pub fn element_name(&self) -> &'static str {
        match self {
            BoundaryKind::Lower => "LowerBoundary",
            BoundaryKind::Upper => "UpperBoundary",
        }
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryKind::Lower => f.write_str("lower"),
            BoundaryKind::Upper => f.write_str("upper"),
        }
    }
}

/// One end of a `PropertyIsBetween` range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundary {
    pub kind: BoundaryKind,
    pub expression: Expression,
}

impl Boundary {
    pub fn new(kind: BoundaryKind, expression: impl Into<Node>) -> Result<Self> {
        Ok(Self {
            kind,
            expression: node::expect_expression(expression.into())?,
        })
    }

    pub fn lower(expression: impl Into<Node>) -> Result<Self> {
        Self::new(BoundaryKind::Lower, expression)
    }

    pub fn upper(expression: impl Into<Node>) -> Result<Self> {
        Self::new(BoundaryKind::Upper, expression)
    }
}

fn expect_boundary(node: Node, slot: BoundaryKind) -> Result<Boundary> {
    match node {
        Node::Boundary(boundary) if boundary.kind == slot => Ok(boundary),
        Node::Boundary(boundary) => Err(FesError::InvalidBoundaryType {
            expected: slot,
            found: boundary.kind,
        }),
        other => Err(FesError::InvalidExpression(format!(
            "{slot} boundary slot expects a Boundary, got {:?}",
            other.kind()
        ))),
    }
}

/// Inclusive range check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BetweenComparisonOperator {
    pub expression: Expression,
    lower_boundary: Boundary,
    upper_boundary: Boundary,
}

impl BetweenComparisonOperator {
    pub fn new(
        expression: impl Into<Node>,
        lower_boundary: impl Into<Node>,
        upper_boundary: impl Into<Node>,
    ) -> Result<Self> {
        Ok(Self {
            expression: node::expect_expression(expression.into())?,
            lower_boundary: expect_boundary(lower_boundary.into(), BoundaryKind::Lower)?,
            upper_boundary: expect_boundary(upper_boundary.into(), BoundaryKind::Upper)?,
        })
    }

    pub fn lower_boundary(&self) -> &Boundary {
        &self.lower_boundary
    }

    pub fn upper_boundary(&self) -> &Boundary {
        &self.upper_boundary
    }

    pub fn set_lower_boundary(&mut self, boundary: impl Into<Node>) -> Result<()> {
        self.lower_boundary = expect_boundary(boundary.into(), BoundaryKind::Lower)?;
        Ok(())
    }

    pub fn set_upper_boundary(&mut self, boundary: impl Into<Node>) -> Result<()> {
        self.upper_boundary = expect_boundary(boundary.into(), BoundaryKind::Upper)?;
        Ok(())
    }
}

/// Tests whether the property exists on the resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NullOperator {
    pub expression: Expression,
}

impl NullOperator {
    pub fn new(expression: impl Into<Node>) -> Result<Self> {
        Ok(Self {
            expression: node::expect_expression(expression.into())?,
        })
    }
}

/// Tests whether the property value is nil, optionally for a given reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NilOperator {
    pub expression: Expression,
    pub nil_reason: String,
}

impl NilOperator {
    pub const DEFAULT_NIL_REASON: &'static str = "equals";

    pub fn new(expression: impl Into<Node>) -> Result<Self> {
        Ok(Self {
            expression: node::expect_expression(expression.into())?,
            nil_reason: Self::DEFAULT_NIL_REASON.to_string(),
        })
    }

    pub fn with_nil_reason(mut self, nil_reason: impl Into<String>) -> Self {
        self.nil_reason = nil_reason.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ComparisonOperator {
    Binary(BinaryComparisonOperator),
    Like(LikeOperator),
    Between(BetweenComparisonOperator),
    Null(NullOperator),
    Nil(NilOperator),
}

impl ComparisonOperator {
    pub fn element_name(&self) -> &'static str {
        match self {
            ComparisonOperator::Binary(op) => op.operator_type.as_str(),
            ComparisonOperator::Like(_) => "PropertyIsLike",
            ComparisonOperator::Between(_) => "PropertyIsBetween",
            ComparisonOperator::Null(_) => "PropertyIsNull",
            ComparisonOperator::Nil(_) => "PropertyIsNil",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Literal, ValueReference};

    fn vr(name: &str) -> ValueReference {
        ValueReference::new(name).unwrap()
    }

    #[test]
    fn operator_equality() {
        let build = || {
            BinaryComparisonOperator::new(
                BinaryComparisonName::PropertyIsEqualTo,
                vr("this"),
                Literal::new("that"),
            )
            .unwrap()
            .with_match_action(MatchAction::Any)
            .with_match_case(true)
        };
        assert_eq!(build(), build());
        assert_ne!(build(), build().with_match_case(false));
    }

    #[test]
    fn every_binary_comparison_name_round_trips() {
        for name in [
            "PropertyIsEqualTo",
            "PropertyIsNotEqualTo",
            "PropertyIsGreaterThan",
            "PropertyIsGreaterThanOrEqualTo",
            "PropertyIsLessThan",
            "PropertyIsLessThanOrEqualTo",
        ] {
            let operator = BinaryComparisonOperator::from_name(name, vr("fake"), vr("phony")).unwrap();
            assert_eq!(operator.operator_type, name.parse().unwrap());
            assert_eq!(operator.operator_type.as_str(), name);
        }
    }

    #[test]
    fn invalid_binary_comparisons_fail_with_distinct_kinds() {
        assert!(matches!(
            BinaryComparisonOperator::from_name("fake_type", vr("first"), vr("second")),
            Err(FesError::InvalidOperator(_))
        ));
        assert!(matches!(
            BinaryComparisonOperator::from_name("PropertyIsEqualTo", "first", vr("second")),
            Err(FesError::InvalidExpression(_))
        ));
        assert!(matches!(
            BinaryComparisonOperator::from_name("PropertyIsEqualTo", vr("first"), "second"),
            Err(FesError::InvalidExpression(_))
        ));
        assert!(matches!(
            "fake action".parse::<MatchAction>(),
            Err(FesError::InvalidMatchAction(_))
        ));
    }

    #[test]
    fn defaults() {
        let operator = BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsLessThan,
            vr("DEPTH"),
            Literal::new("30"),
        )
        .unwrap();
        assert!(operator.match_case);
        assert_eq!(operator.match_action, MatchAction::Any);

        let like = LikeOperator::new(vr("name"), Literal::new("Ab*")).unwrap();
        assert_eq!(like.wild_card, "");
        assert_eq!(like.single_char, "");
        assert_eq!(like.escape_char, "");

        let nil = NilOperator::new(vr("name")).unwrap();
        assert_eq!(nil.nil_reason, "equals");
    }

    #[test]
    fn failed_setter_leaves_field_unmodified() {
        let mut operator = BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsEqualTo,
            vr("first"),
            vr("second"),
        )
        .unwrap();
        assert!(operator.set_second_expression(10).is_err());
        assert_eq!(operator.second_expression, Expression::from(vr("second")));
        operator.set_second_expression(Literal::new(10)).unwrap();
        assert_eq!(operator.second_expression, Expression::from(Literal::new(10)));
    }

    #[test]
    fn boundary_must_match_its_slot() {
        let lower = Boundary::lower(Literal::new(1)).unwrap();
        let upper = Boundary::upper(Literal::new(10)).unwrap();

        assert!(matches!(
            BetweenComparisonOperator::new(vr("depth"), upper.clone(), upper.clone()),
            Err(FesError::InvalidBoundaryType {
                expected: BoundaryKind::Lower,
                found: BoundaryKind::Upper
            })
        ));
        assert!(matches!(
            BetweenComparisonOperator::new(vr("depth"), lower.clone(), lower.clone()),
            Err(FesError::InvalidBoundaryType {
                expected: BoundaryKind::Upper,
                found: BoundaryKind::Lower
            })
        ));

        let mut between =
            BetweenComparisonOperator::new(vr("depth"), lower.clone(), upper.clone()).unwrap();
        assert!(matches!(
            between.set_upper_boundary(lower.clone()),
            Err(FesError::InvalidBoundaryType { .. })
        ));
        assert_eq!(between.upper_boundary(), &upper);
        assert!(matches!(
            between.set_lower_boundary(Literal::new(1)),
            Err(FesError::InvalidExpression(_))
        ));
    }
}
