//! Spatial operators: distance buffers and binary topological predicates.

use serde::Serialize;

use super::node::{self, Node};
use super::Expression;
use crate::error::{FesError, Result};
use crate::validators::validate_wkt;

operator_names! {
    DistanceOperatorName {
        Beyond => "Beyond",
        DWithin => "DWithin",
    }
}

operator_names! {
    #[allow(clippy::upper_case_acronyms)]
    SpatialOperatorName {
        BBOX => "BBOX",
        Equals => "Equals",
        Disjoint => "Disjoint",
        Intersects => "Intersects",
        Touches => "Touches",
        Crosses => "Crosses",
        Within => "Within",
        Contains => "Contains",
        Overlaps => "Overlaps",
    }
}

/// A WKT geometry with the reference system it was declared in, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    wkt: String,
    srs_name: Option<String>,
}

impl Geometry {
    pub fn from_wkt(wkt: impl Into<String>) -> Result<Self> {
        let wkt = wkt.into();
        validate_wkt(&wkt)?;
        Ok(Self {
            wkt,
            srs_name: None,
        })
    }

    pub fn with_srs_name(mut self, srs_name: impl Into<String>) -> Self {
        self.srs_name = Some(srs_name.into());
        self
    }

    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn srs_name(&self) -> Option<&str> {
        self.srs_name.as_deref()
    }
}

/// Second operand of a binary spatial operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SpatialDescription {
    Expression(Expression),
    Geometry(Geometry),
}

/// Distance plus its unit of measure (`uom`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distance {
    pub value: f64,
    pub units: String,
}

impl Distance {
    pub fn new(value: f64, units: impl Into<String>) -> Self {
        Self {
            value,
            units: units.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceOperator {
    pub operator_type: DistanceOperatorName,
    pub expression: Expression,
    geometry: Geometry,
    pub distance: Distance,
}

impl DistanceOperator {
    pub fn new(
        operator_type: DistanceOperatorName,
        expression: impl Into<Node>,
        geometry: impl Into<Node>,
        distance: Distance,
    ) -> Result<Self> {
        let expression = node::expect_expression(expression.into())?;
        let geometry = match geometry.into() {
            Node::Geometry(geometry) => geometry,
            Node::Value(value) => Geometry::from_wkt(value.to_string())?,
            other => {
                return Err(FesError::InvalidExpression(format!(
                    "distance operators need a geometry, got {:?}",
                    other.kind()
                )));
            }
        };
        Ok(Self {
            operator_type,
            expression,
            geometry,
            distance,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinarySpatialOperator {
    pub operator_type: SpatialOperatorName,
    pub first_operand: Expression,
    second_operand: SpatialDescription,
}

impl BinarySpatialOperator {
    pub fn new(
        operator_type: SpatialOperatorName,
        first_operand: impl Into<Node>,
        second_operand: impl Into<Node>,
    ) -> Result<Self> {
        Ok(Self {
            operator_type,
            first_operand: node::expect_expression(first_operand.into())?,
            second_operand: expect_spatial_description(second_operand.into())?,
        })
    }

    pub fn second_operand(&self) -> &SpatialDescription {
        &self.second_operand
    }

    pub fn set_second_operand(&mut self, operand: impl Into<Node>) -> Result<()> {
        self.second_operand = expect_spatial_description(operand.into())?;
        Ok(())
    }
}

/// Expressions pass through; raw values must be WKT, and a value that is
/// not is an invalid operator rather than an invalid expression.
fn expect_spatial_description(node: Node) -> Result<SpatialDescription> {
    match node {
        Node::Expression(expression) => Ok(SpatialDescription::Expression(expression)),
        Node::Geometry(geometry) => Ok(SpatialDescription::Geometry(geometry)),
        Node::Value(value) => Geometry::from_wkt(value.to_string())
            .map(SpatialDescription::Geometry)
            .map_err(|err| FesError::InvalidOperator(err.to_string())),
        other => Err(FesError::InvalidExpression(format!(
            "spatial operand must be an expression or a geometry, got {:?}",
            other.kind()
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SpatialOperator {
    Distance(DistanceOperator),
    Binary(BinarySpatialOperator),
}
