//! Filter trees to fes XML, and back at node level.

use roxmltree::Document;

use super::element::XmlElement;
use super::schema::SchemaValidator;
use super::{gml, parser};
use crate::error::{FesError, Result};
use crate::model::{
    BinaryComparisonOperator, Boundary, ComparisonOperator, Expression, Filter, Function,
    LikeOperator, Literal, LogicalOperator, Node, Operator, Predicate, ResourceId,
    SpatialDescription, SpatialOperator, TemporalOperand, TemporalOperator, Value,
};

#[derive(Debug, Clone, Default)]
pub struct FesXmlSerializer {
    schema: Option<SchemaValidator>,
    pretty: bool,
}

impl FesXmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate documents against `schema` when deserializing.
    pub fn with_schema(mut self, schema: SchemaValidator) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Indent the output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn serialize(&self, node: impl Into<Node>) -> Result<String> {
        to_element(&node.into())?.to_xml(self.pretty)
    }

    /// Parse one fes (or GML) element, of any kind, back into a node.
    pub fn deserialize(&self, xml: &str) -> Result<Node> {
        let doc = Document::parse(xml).map_err(|e| FesError::parse(e.to_string()))?;
        if let Some(schema) = &self.schema {
            schema.validate(&doc)?;
        }
        parser::parse_node(doc.root_element())
    }
}

/// Build the element tree for `node`.
pub fn to_element(node: &Node) -> Result<XmlElement> {
    match node {
        Node::Filter(filter) => filter_element(filter),
        Node::Operator(operator) => operator_element(operator),
        Node::Expression(expression) => expression_element(expression),
        Node::Boundary(boundary) => boundary_element(boundary),
        Node::Temporal(object) => Ok(gml::temporal_element(object)),
        Node::Geometry(_) => Err(FesError::Unsupported(
            "encoding WKT geometries as GML".into(),
        )),
        Node::Value(value) => Err(FesError::Unsupported(format!(
            "a bare {} value has no fes encoding; wrap it in a Literal",
            value.kind()
        ))),
    }
}

pub fn filter_element(filter: &Filter) -> Result<XmlElement> {
    Ok(XmlElement::fes("Filter").with_child(operator_element(filter.predicate())?))
}

pub fn operator_element(operator: &Operator) -> Result<XmlElement> {
    match operator {
        Operator::Comparison(op) => comparison_element(op),
        Operator::Spatial(op) => spatial_element(op),
        Operator::Temporal(op) => temporal_element(op),
        Operator::Logical(op) => logical_element(op),
        Operator::Identifier(rid) => Ok(resource_id_element(rid)),
    }
}

fn comparison_element(operator: &ComparisonOperator) -> Result<XmlElement> {
    let element = XmlElement::fes(operator.element_name());
    match operator {
        ComparisonOperator::Binary(BinaryComparisonOperator {
            first_expression,
            second_expression,
            match_case,
            match_action,
            ..
        }) => Ok(element
            .with_attribute("matchCase", if *match_case { "true" } else { "false" })
            .with_attribute("matchAction", match_action.as_str())
            .with_child(expression_element(first_expression)?)
            .with_child(expression_element(second_expression)?)),
        ComparisonOperator::Like(LikeOperator {
            first_expression,
            second_expression,
            wild_card,
            single_char,
            escape_char,
        }) => Ok(element
            .with_attribute("wildCard", wild_card.as_str())
            .with_attribute("singleChar", single_char.as_str())
            .with_attribute("escapeChar", escape_char.as_str())
            .with_child(expression_element(first_expression)?)
            .with_child(expression_element(second_expression)?)),
        ComparisonOperator::Between(op) => Ok(element
            .with_child(expression_element(&op.expression)?)
            .with_child(boundary_element(op.lower_boundary())?)
            .with_child(boundary_element(op.upper_boundary())?)),
        ComparisonOperator::Null(op) => Ok(element.with_child(expression_element(&op.expression)?)),
        ComparisonOperator::Nil(op) => Ok(element
            .with_attribute("nilReason", op.nil_reason.as_str())
            .with_child(expression_element(&op.expression)?)),
    }
}

fn boundary_element(boundary: &Boundary) -> Result<XmlElement> {
    Ok(XmlElement::fes(boundary.kind.element_name())
        .with_child(expression_element(&boundary.expression)?))
}

fn spatial_element(operator: &SpatialOperator) -> Result<XmlElement> {
    match operator {
        SpatialOperator::Binary(op) => {
            let second = match op.second_operand() {
                SpatialDescription::Expression(expression) => expression_element(expression)?,
                SpatialDescription::Geometry(_) => {
                    return Err(FesError::Unsupported(format!(
                        "{} with a WKT geometry operand",
                        op.operator_type
                    )));
                }
            };
            Ok(XmlElement::fes(op.operator_type.as_str())
                .with_child(expression_element(&op.first_operand)?)
                .with_child(second))
        }
        SpatialOperator::Distance(op) => Err(FesError::Unsupported(format!(
            "{} serialization",
            op.operator_type
        ))),
    }
}

fn temporal_element(operator: &TemporalOperator) -> Result<XmlElement> {
    let second = match operator.second_operand() {
        TemporalOperand::Expression(expression) => expression_element(expression)?,
        TemporalOperand::Object(object) => gml::temporal_element(object),
    };
    Ok(XmlElement::fes(operator.operator_type.as_str())
        .with_child(expression_element(&operator.first_operand)?)
        .with_child(second))
}

fn predicate_element(predicate: &Predicate) -> Result<XmlElement> {
    match predicate {
        Predicate::Expression(expression) => expression_element(expression),
        Predicate::Operator(operator) => operator_element(operator),
    }
}

fn logical_element(operator: &LogicalOperator) -> Result<XmlElement> {
    match operator {
        LogicalOperator::Binary(op) => {
            let mut element = XmlElement::fes(op.operator_type.as_str());
            for predicate in op.predicates() {
                element = element.with_child(predicate_element(predicate)?);
            }
            Ok(element)
        }
        LogicalOperator::Unary(op) => Ok(XmlElement::fes(op.operator_type.as_str())
            .with_child(predicate_element(op.operand())?)),
    }
}

fn resource_id_element(rid: &ResourceId) -> XmlElement {
    let mut element = XmlElement::fes("ResourceId").with_attribute("rid", rid.rid());
    if let Some(previous_rid) = rid.previous_rid() {
        element = element.with_attribute("previousRid", previous_rid);
    }
    if let Some(version) = &rid.version {
        element = element.with_attribute("version", version.to_string());
    }
    if let Some(start) = rid.start_time() {
        element = element.with_attribute("startDate", start);
    }
    if let Some(end) = rid.end_time() {
        element = element.with_attribute("endDate", end);
    }
    element
}

pub fn expression_element(expression: &Expression) -> Result<XmlElement> {
    match expression {
        Expression::ValueReference(vr) => {
            Ok(XmlElement::fes("ValueReference").with_text(vr.value()))
        }
        Expression::Literal(literal) => literal_element(literal),
        Expression::Function(function) => function_element(function),
    }
}

/// The `type` attribute is written unless the literal is text whose type
/// is the inferred one, so parsing the element gives back an equal literal.
fn literal_element(literal: &Literal) -> Result<XmlElement> {
    let element = match literal.value() {
        Value::Null | Value::List(_) | Value::Map(_) => {
            return Err(FesError::Unsupported(format!(
                "{} literals",
                literal.value().kind()
            )));
        }
        value => XmlElement::fes("Literal").with_text(value.to_string()),
    };
    let implicit = matches!(literal.value(), Value::String(_)) && literal.has_inferred_type();
    if implicit {
        return Ok(element);
    }
    // The reader casts typed text, so the type has to give the same value back.
    let text = literal.value().to_string();
    if parser::cast_literal(&text, Some(literal.type_())).ok().as_ref() != Some(literal.value()) {
        return Err(FesError::Serialization(format!(
            "{} literal {text:?} does not read back as {}",
            literal.value().kind(),
            literal.type_()
        )));
    }
    Ok(element.with_attribute("type", literal.type_()))
}

fn function_element(function: &Function) -> Result<XmlElement> {
    let mut element = XmlElement::fes("Function").with_attribute("name", function.name());
    for argument in function.arguments() {
        element = element.with_child(expression_element(argument)?);
    }
    Ok(element)
}
