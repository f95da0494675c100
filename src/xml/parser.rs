//! `fes:Filter` documents to filter trees.
//!
//! Elements are classified once, from their namespace and local name, into
//! an [`OperatorTag`]; each tag has one handler that reads the element's
//! children recursively.

use roxmltree::{Document, Node as XmlNode};
use tracing::debug;

use super::schema::SchemaValidator;
use super::{FES_NAMESPACE, child_elements, clark_name, gml, is_gml};
use crate::dispatch::SyntaxParser;
use crate::error::{FesError, Result};
use crate::model::{
    BetweenComparisonOperator, BinaryComparisonName, BinaryComparisonOperator, BinaryLogicOperator,
    BinaryLogicType, BinarySpatialOperator, Boundary, BoundaryKind, Distance, DistanceOperator,
    DistanceOperatorName, Expression, Filter, Function, LikeOperator, Literal, MatchAction,
    NilOperator, Node, NullOperator, Operator, ResourceId, SpatialOperatorName, TemporalOperator,
    TemporalOperatorName, UnaryLogicOperator, UnaryLogicType, Value, ValueReference, Version,
};

pub const SYNTAX: &str = "fes-xml";

fn mismatch(reason: impl Into<String>) -> FesError {
    FesError::SyntaxMismatch {
        syntax: SYNTAX,
        reason: reason.into(),
    }
}

fn is_fes(node: XmlNode<'_, '_>) -> bool {
    node.tag_name().namespace() == Some(FES_NAMESPACE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperatorTag {
    BinaryComparison(BinaryComparisonName),
    Like,
    Between,
    Null,
    Nil,
    Distance(DistanceOperatorName),
    BinarySpatial(SpatialOperatorName),
    BinaryLogic(BinaryLogicType),
    UnaryLogic(UnaryLogicType),
    Temporal(TemporalOperatorName),
    ResourceId,
}

impl OperatorTag {
    fn of(node: XmlNode<'_, '_>) -> Option<Self> {
        if !is_fes(node) {
            return None;
        }
        let name = node.tag_name().name();
        let tag = match name {
            "PropertyIsLike" => OperatorTag::Like,
            "PropertyIsBetween" => OperatorTag::Between,
            "PropertyIsNull" => OperatorTag::Null,
            "PropertyIsNil" => OperatorTag::Nil,
            "ResourceId" => OperatorTag::ResourceId,
            _ => {
                return name
                    .parse()
                    .map(OperatorTag::BinaryComparison)
                    .or_else(|_| name.parse().map(OperatorTag::Distance))
                    .or_else(|_| name.parse().map(OperatorTag::BinarySpatial))
                    .or_else(|_| name.parse().map(OperatorTag::BinaryLogic))
                    .or_else(|_| name.parse().map(OperatorTag::UnaryLogic))
                    .or_else(|_| name.parse().map(OperatorTag::Temporal))
                    .ok();
            }
        };
        Some(tag)
    }
}

/// Exactly `N` element children, or a parse error.
fn children<'a, 'i, const N: usize>(node: XmlNode<'a, 'i>) -> Result<[XmlNode<'a, 'i>; N]> {
    let found: Vec<XmlNode<'a, 'i>> = child_elements(node).collect();
    <[XmlNode<'a, 'i>; N]>::try_from(found).map_err(|found| {
        FesError::parse(format!(
            "{} expects {N} child elements, found {}",
            clark_name(node),
            found.len()
        ))
    })
}

/// Parses fes:Filter documents. Holds no per-document state, so one parser
/// can be shared.
#[derive(Debug, Clone, Default)]
pub struct FesXmlParser {
    schema: Option<SchemaValidator>,
}

impl FesXmlParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every document against `schema` before building the tree.
    pub fn with_schema(mut self, schema: SchemaValidator) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn parse(&self, input: &str) -> Result<Filter> {
        // Default options reject DTDs, so no entity is ever expanded.
        let doc = Document::parse(input).map_err(|e| mismatch(e.to_string()))?;
        let root = doc.root_element();
        if !is_fes(root) || root.tag_name().name() != "Filter" {
            return Err(mismatch(format!(
                "invalid filter element {}",
                clark_name(root)
            )));
        }
        if let Some(schema) = &self.schema {
            schema.validate(&doc)?;
        }
        parse_filter_element(root)
    }
}

impl SyntaxParser for FesXmlParser {
    fn name(&self) -> &'static str {
        SYNTAX
    }

    fn parse(&self, input: &str) -> Result<Filter> {
        FesXmlParser::parse(self, input)
    }
}

pub fn parse_filter_element(node: XmlNode<'_, '_>) -> Result<Filter> {
    let [predicate] = children(node)?;
    if !is_fes(predicate) {
        return Err(FesError::InvalidOperator(format!(
            "{} is not in the fes namespace",
            clark_name(predicate)
        )));
    }
    Filter::new(parse_operator(predicate)?)
}

/// Any fes or GML element as a node of the filter tree.
pub fn parse_node(node: XmlNode<'_, '_>) -> Result<Node> {
    let namespace = node.tag_name().namespace();
    match node.tag_name().name() {
        "Filter" if is_fes(node) => parse_filter_element(node).map(Node::from),
        "ValueReference" | "Literal" | "Function" if is_fes(node) => {
            parse_expression(node).map(Node::from)
        }
        "LowerBoundary" | "UpperBoundary" if is_fes(node) => parse_boundary(node).map(Node::from),
        _ if is_fes(node) => parse_operator(node).map(Node::from),
        "TimeInstant" | "TimePeriod" if is_gml(namespace) => gml::parse_temporal(node).map(Node::from),
        _ if is_gml(namespace) => gml::parse_geometry(node).map(Node::from),
        _ => Err(FesError::parse(format!(
            "{} is neither a fes nor a GML element",
            clark_name(node)
        ))),
    }
}

pub fn parse_operator(node: XmlNode<'_, '_>) -> Result<Operator> {
    let tag = OperatorTag::of(node).ok_or_else(|| {
        FesError::InvalidOperator(format!("unrecognized operator {}", clark_name(node)))
    })?;
    let operator: Operator = match tag {
        OperatorTag::BinaryComparison(name) => parse_binary_comparison(name, node)?.into(),
        OperatorTag::Like => parse_like(node)?.into(),
        OperatorTag::Between => {
            let [expression, lower, upper] = children(node)?;
            BetweenComparisonOperator::new(
                parse_expression(expression)?,
                parse_boundary(lower)?,
                parse_boundary(upper)?,
            )?
            .into()
        }
        OperatorTag::Null => {
            let [expression] = children(node)?;
            NullOperator::new(parse_expression(expression)?)?.into()
        }
        OperatorTag::Nil => {
            let [expression] = children(node)?;
            let operator = NilOperator::new(parse_expression(expression)?)?;
            match node.attribute("nilReason") {
                Some(reason) => operator.with_nil_reason(reason).into(),
                None => operator.into(),
            }
        }
        OperatorTag::Distance(name) => parse_distance(name, node)?.into(),
        OperatorTag::BinarySpatial(name) => {
            let [first, second] = children(node)?;
            BinarySpatialOperator::new(
                name,
                parse_expression(first)?,
                expression_or(second, gml::parse_geometry)?,
            )?
            .into()
        }
        OperatorTag::BinaryLogic(name) => {
            let operands = child_elements(node)
                .map(parse_predicate)
                .collect::<Result<Vec<Node>>>()?;
            BinaryLogicOperator::from_operands(name, operands)?.into()
        }
        OperatorTag::UnaryLogic(name) => {
            let [operand] = children(node)?;
            UnaryLogicOperator::new(name, parse_predicate(operand)?)?.into()
        }
        OperatorTag::Temporal(name) => {
            let [first, second] = children(node)?;
            TemporalOperator::new(
                name,
                parse_expression(first)?,
                expression_or(second, gml::parse_temporal)?,
            )?
            .into()
        }
        OperatorTag::ResourceId => parse_resource_id(node)?.into(),
    };
    Ok(operator)
}

/// Operand of a logical operator: a nested operator or an expression.
fn parse_predicate(node: XmlNode<'_, '_>) -> Result<Node> {
    if OperatorTag::of(node).is_some() {
        parse_operator(node).map(Node::from)
    } else {
        parse_expression(node).map(Node::from)
    }
}

/// Read `node` as an expression; only when it is not one at all, read it
/// with `fallback` instead.
fn expression_or<'a, 'i, T, F>(node: XmlNode<'a, 'i>, fallback: F) -> Result<Node>
where
    T: Into<Node>,
    F: Fn(XmlNode<'a, 'i>) -> Result<T>,
{
    match parse_expression(node) {
        Ok(expression) => Ok(expression.into()),
        Err(FesError::InvalidExpression(reason)) => {
            debug!(element = %clark_name(node), %reason, "not an expression, reading as GML");
            fallback(node).map(Into::into)
        }
        Err(err) => Err(err),
    }
}

fn parse_match_case(node: XmlNode<'_, '_>) -> Result<bool> {
    match node.attribute("matchCase") {
        None | Some("true") | Some("1") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(FesError::parse(format!(
            "matchCase must be a boolean, got {other:?}"
        ))),
    }
}

fn parse_binary_comparison(
    name: BinaryComparisonName,
    node: XmlNode<'_, '_>,
) -> Result<BinaryComparisonOperator> {
    let [first, second] = children(node)?;
    let match_action = node
        .attribute("matchAction")
        .map(str::parse::<MatchAction>)
        .transpose()?
        .unwrap_or_default();
    Ok(
        BinaryComparisonOperator::new(name, parse_expression(first)?, parse_expression(second)?)?
            .with_match_case(parse_match_case(node)?)
            .with_match_action(match_action),
    )
}

fn parse_like(node: XmlNode<'_, '_>) -> Result<LikeOperator> {
    let [first, second] = children(node)?;
    Ok(
        LikeOperator::new(parse_expression(first)?, parse_expression(second)?)?.with_pattern_tokens(
            node.attribute("wildCard").unwrap_or_default(),
            node.attribute("singleChar").unwrap_or_default(),
            node.attribute("escapeChar").unwrap_or_default(),
        ),
    )
}

fn parse_boundary(node: XmlNode<'_, '_>) -> Result<Boundary> {
    let kind = match node.tag_name().name() {
        "LowerBoundary" if is_fes(node) => BoundaryKind::Lower,
        "UpperBoundary" if is_fes(node) => BoundaryKind::Upper,
        _ => {
            return Err(FesError::InvalidExpression(format!(
                "{} is not a boundary",
                clark_name(node)
            )));
        }
    };
    let [expression] = children(node)?;
    Boundary::new(kind, parse_expression(expression)?)
}

fn parse_distance(name: DistanceOperatorName, node: XmlNode<'_, '_>) -> Result<DistanceOperator> {
    let [expression, geometry, distance] = children(node)?;

    // A fes:Literal may carry the geometry as WKT text.
    let geometry = match expression_or(geometry, gml::parse_geometry)? {
        Node::Expression(Expression::Literal(literal)) => Node::Value(literal.value().clone()),
        other => other,
    };

    if !is_fes(distance) || distance.tag_name().name() != "Distance" {
        return Err(FesError::parse(format!(
            "expected fes:Distance, got {}",
            clark_name(distance)
        )));
    }
    let text = distance.text().unwrap_or_default().trim();
    let value = text
        .parse::<f64>()
        .map_err(|_| FesError::parse(format!("distance {text:?} is not a number")))?;
    let units = distance.attribute("uom").unwrap_or_default();

    DistanceOperator::new(
        name,
        parse_expression(expression)?,
        geometry,
        Distance::new(value, units),
    )
}

fn parse_resource_id(node: XmlNode<'_, '_>) -> Result<ResourceId> {
    let rid = node
        .attribute("rid")
        .ok_or_else(|| FesError::parse("fes:ResourceId has no rid attribute"))?;
    let mut resource_id = ResourceId::new(rid)?;
    if let Some(previous_rid) = node.attribute("previousRid") {
        resource_id = resource_id.with_previous_rid(previous_rid)?;
    }
    if let Some(version) = node.attribute("version") {
        resource_id = resource_id.with_version(version.parse::<Version>()?);
    }
    let start = node.attribute("startDate").map(str::to_string);
    let end = node.attribute("endDate").map(str::to_string);
    if start.is_some() || end.is_some() {
        resource_id = resource_id.with_time_range(start, end)?;
    }
    Ok(resource_id)
}

pub fn parse_expression(node: XmlNode<'_, '_>) -> Result<Expression> {
    if !is_fes(node) {
        return Err(FesError::InvalidExpression(format!(
            "{} is not in the fes namespace",
            clark_name(node)
        )));
    }
    let expression = match node.tag_name().name() {
        "ValueReference" => ValueReference::new(node.text().unwrap_or_default().trim())?.into(),
        "Literal" => parse_literal(node)?.into(),
        "Function" => {
            let name = node
                .attribute("name")
                .ok_or_else(|| FesError::parse("fes:Function has no name attribute"))?;
            let arguments = child_elements(node)
                .map(|argument| parse_expression(argument).map(Node::from))
                .collect::<Result<Vec<Node>>>()?;
            Function::with_arguments(name, arguments)?.into()
        }
        _ => {
            return Err(FesError::InvalidExpression(format!(
                "{} is not an expression",
                clark_name(node)
            )));
        }
    };
    Ok(expression)
}

fn parse_literal(node: XmlNode<'_, '_>) -> Result<Literal> {
    let declared = node.attribute("type");
    let value = match child_elements(node).next() {
        Some(child) if is_gml(child.tag_name().namespace()) => {
            Value::String(gml::parse_geometry(child)?.wkt().to_string())
        }
        Some(child) => {
            return Err(FesError::parse(format!(
                "unsupported literal content {}",
                clark_name(child)
            )));
        }
        None => cast_literal(node.text().unwrap_or_default(), declared)?,
    };
    Ok(match declared {
        Some(type_) => Literal::with_type(value, type_),
        None => Literal::new(value),
    })
}

/// Apply a literal's declared type to its text. Types without a cast keep
/// the text as is.
pub fn cast_literal(text: &str, type_: Option<&str>) -> Result<Value> {
    let bad = |what: &str| FesError::parse(format!("{text:?} is not a valid {what}"));
    let value = match type_ {
        Some("xs:int" | "xs:integer" | "xs:long" | "xs:short") => {
            Value::Integer(text.trim().parse().map_err(|_| bad("integer"))?)
        }
        Some("xs:float" | "xs:double" | "xs:decimal") => {
            Value::Float(text.trim().parse().map_err(|_| bad("float"))?)
        }
        Some("xs:boolean") => match text.trim() {
            "true" | "1" => Value::Boolean(true),
            "false" | "0" => Value::Boolean(false),
            _ => return Err(bad("boolean")),
        },
        _ => Value::String(text.to_string()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComparisonOperator, SpatialDescription, SpatialOperator, TemporalOperand};

    const FES: &str = r#"xmlns:fes="http://www.opengis.net/fes/2.0""#;
    const GML: &str = r#"xmlns:gml="http://www.opengis.net/gml/3.2""#;

    fn filter(body: &str) -> String {
        format!("<fes:Filter {FES} {GML}>{body}</fes:Filter>")
    }

    fn parse(body: &str) -> Result<Operator> {
        FesXmlParser::new()
            .parse(&filter(body))
            .map(Filter::into_predicate)
    }

    #[test]
    fn property_is_equal_to() {
        let operator = parse(
            "<fes:PropertyIsEqualTo><fes:ValueReference>SomeProperty</fes:ValueReference>\
             <fes:Literal>100</fes:Literal></fes:PropertyIsEqualTo>",
        )
        .unwrap();
        let expected = BinaryComparisonOperator::new(
            BinaryComparisonName::PropertyIsEqualTo,
            ValueReference::new("SomeProperty").unwrap(),
            Literal::new("100"),
        )
        .unwrap();
        assert_eq!(operator, expected.into());
    }

    #[test]
    fn match_attributes() {
        let operator = parse(
            "<fes:PropertyIsNotEqualTo matchCase=\"false\" matchAction=\"All\">\
             <fes:ValueReference>a</fes:ValueReference><fes:Literal>b</fes:Literal>\
             </fes:PropertyIsNotEqualTo>",
        )
        .unwrap();
        match operator {
            Operator::Comparison(ComparisonOperator::Binary(op)) => {
                assert!(!op.match_case);
                assert_eq!(op.match_action, MatchAction::All);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            parse(
                "<fes:PropertyIsEqualTo matchAction=\"Some\"><fes:ValueReference>a</fes:ValueReference>\
                 <fes:Literal>b</fes:Literal></fes:PropertyIsEqualTo>"
            ),
            Err(FesError::InvalidMatchAction(_))
        ));
    }

    #[test]
    fn literal_casts() {
        assert_eq!(cast_literal("30", Some("xs:int")).unwrap(), Value::Integer(30));
        assert_eq!(cast_literal("2.5", Some("xs:float")).unwrap(), Value::Float(2.5));
        assert_eq!(cast_literal("30", None).unwrap(), Value::String("30".into()));
        assert_eq!(
            cast_literal("2005-05-19", Some("xs:date")).unwrap(),
            Value::String("2005-05-19".into())
        );
        assert!(matches!(cast_literal("abc", Some("xs:int")), Err(FesError::Parse(_))));
    }

    #[test]
    fn rejects_foreign_roots_as_mismatch() {
        let parser = FesXmlParser::new();
        let query = format!("<fes:Query {FES}/>");
        for input in ["DEPTH < 30", "<Filter/>", query.as_str()] {
            assert!(parser.parse(input).unwrap_err().is_syntax_mismatch(), "{input}");
        }
    }

    #[test]
    fn rejects_dtds() {
        let input = format!(
            "<!DOCTYPE fes:Filter [<!ENTITY x SYSTEM \"file:///etc/passwd\">]>{}",
            filter("<fes:PropertyIsNull><fes:ValueReference>&x;</fes:ValueReference></fes:PropertyIsNull>")
        );
        assert!(FesXmlParser::new().parse(&input).is_err());
    }

    #[test]
    fn unknown_operator_and_foreign_predicate() {
        assert!(matches!(
            parse("<fes:PropertyIsAlmost/>"),
            Err(FesError::InvalidOperator(_))
        ));
        assert!(matches!(
            parse("<gml:Point/>"),
            Err(FesError::InvalidOperator(_))
        ));
    }

    #[test]
    fn spatial_operand_falls_back_to_gml() {
        let operator = parse(
            "<fes:Intersects><fes:ValueReference>geom</fes:ValueReference>\
             <gml:Point srsName=\"EPSG:4326\"><gml:pos>1 2</gml:pos></gml:Point></fes:Intersects>",
        )
        .unwrap();
        match operator {
            Operator::Spatial(SpatialOperator::Binary(op)) => match op.second_operand() {
                SpatialDescription::Geometry(g) => {
                    assert!(g.wkt().starts_with("POINT"));
                    assert_eq!(g.srs_name(), Some("EPSG:4326"));
                }
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }

        // A malformed GML operand reports the GML problem.
        assert!(matches!(
            parse(
                "<fes:Within><fes:ValueReference>geom</fes:ValueReference>\
                 <gml:Point><gml:pos>1</gml:pos></gml:Point></fes:Within>"
            ),
            Err(FesError::Parse(_))
        ));
    }

    #[test]
    fn temporal_operand_falls_back_to_gml() {
        let operator = parse(
            "<fes:After><fes:ValueReference>timestamp</fes:ValueReference>\
             <gml:TimeInstant gml:id=\"TI1\"><gml:timePosition>2005-05-19T09:28:40Z</gml:timePosition>\
             </gml:TimeInstant></fes:After>",
        )
        .unwrap();
        match operator {
            Operator::Temporal(op) => {
                assert_eq!(op.operator_type, TemporalOperatorName::After);
                assert!(matches!(op.second_operand(), TemporalOperand::Object(_)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_node_handles_any_element() {
        let xml = format!(
            "<fes:UpperBoundary {FES}><fes:Literal>10</fes:Literal></fes:UpperBoundary>"
        );
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(
            parse_node(doc.root_element()).unwrap(),
            Node::from(Boundary::upper(Literal::new("10")).unwrap())
        );

        let xml = format!(
            "<fes:Function {FES} name=\"sin\"><fes:ValueReference>angle</fes:ValueReference></fes:Function>"
        );
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(
            parse_node(doc.root_element()).unwrap(),
            Node::from(
                Function::with_arguments("sin", [ValueReference::new("angle").unwrap()]).unwrap()
            )
        );

        let doc = Document::parse("<other/>").unwrap();
        assert!(parse_node(doc.root_element()).is_err());
    }

    #[test]
    fn resource_id_time_range_order() {
        let rid = |start: &str, end: &str| {
            parse(&format!(
                r#"<fes:ResourceId rid="a.1" startDate="{start}" endDate="{end}"/>"#
            ))
        };
        assert!(rid("2005-01-01", "2006-01-01").is_ok());
        assert!(matches!(
            rid("2006-01-01", "2005-01-01"),
            Err(FesError::Validation(_))
        ));
    }
}
