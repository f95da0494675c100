//! Leaf expressions: property references, literals and functions.

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::node::{self, Node};
use super::value::Value;
use crate::error::Result;
use crate::validators::{self, Validator, validate_property_name};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    ValueReference(ValueReference),
    Literal(Literal),
    Function(Function),
}

impl Expression {
    pub fn element_name(&self) -> &'static str {
        match self {
            Expression::ValueReference(_) => "ValueReference",
            Expression::Literal(_) => "Literal",
            Expression::Function(_) => "Function",
        }
    }
}

impl From<ValueReference> for Expression {
    fn from(value: ValueReference) -> Self {
        Expression::ValueReference(value)
    }
}

impl From<Literal> for Expression {
    fn from(value: Literal) -> Self {
        Expression::Literal(value)
    }
}

impl From<Function> for Expression {
    fn from(value: Function) -> Self {
        Expression::Function(value)
    }
}

/// Names a property (or a path into one) of the resource being filtered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueReference {
    value: String,
}

impl ValueReference {
    pub const DEFAULT_VALIDATORS: &'static [Validator] = &[validate_property_name];

    pub fn new(value: impl Into<String>) -> Result<Self> {
        Self::with_validators(value, Self::DEFAULT_VALIDATORS)
    }

    pub fn with_validators(value: impl Into<String>, validators: &[Validator]) -> Result<Self> {
        let value = value.into();
        validators::apply(validators, &value)?;
        Ok(Self { value })
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A constant value plus its XML Schema / GML type name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Literal {
    value: Value,
    #[serde(rename = "type")]
    type_: String,
}

impl Literal {
    /// Literal whose type is inferred from the value.
    pub fn new(value: impl Into<Value>) -> Self {
        let value = value.into();
        let type_ = infer_type(&value).to_string();
        Self { value, type_ }
    }

    pub fn with_type(value: impl Into<Value>, type_: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            type_: type_.into(),
        }
    }

    /// Validators see the literal's text form.
    pub fn with_validators(
        value: impl Into<Value>,
        type_: Option<&str>,
        validators: &[Validator],
    ) -> Result<Self> {
        let value = value.into();
        validators::apply(validators, &value.to_string())?;
        Ok(match type_ {
            Some(type_) => Self::with_type(value, type_),
            None => Self::new(value),
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// True when the type is the one [`infer_type`] picks for the value.
    pub fn has_inferred_type(&self) -> bool {
        self.type_ == infer_type(&self.value)
    }
}

type TypeGuess = (fn(&Value) -> bool, &'static str);

/// Checked in order; the first matching guess names the type.
const TYPE_GUESSES: &[TypeGuess] = &[
    (is_boolean, "xs:boolean"),
    (is_integer, "xs:integer"),
    (is_float, "xs:double"),
    (is_wkt_point, "gml:Point"),
    (is_wkt_linestring, "gml:LineString"),
    (is_wkt_polygon, "gml:Polygon"),
    (is_wkt_multipoint, "gml:MultiPoint"),
    (is_wkt_multilinestring, "gml:MultiLineString"),
    (is_wkt_multipolygon, "gml:MultiPolygon"),
    (is_wkt_collection, "gml:MultiGeometry"),
    (is_date_time, "xs:dateTime"),
    (is_date, "xs:date"),
    (is_string, "xs:string"),
    (is_list, "xs:list"),
];

const FALLBACK_TYPE: &str = "xs:anyType";

pub fn infer_type(value: &Value) -> &'static str {
    TYPE_GUESSES
        .iter()
        .find(|(guess, _)| guess(value))
        .map(|(_, type_)| *type_)
        .unwrap_or(FALLBACK_TYPE)
}

fn is_boolean(value: &Value) -> bool {
    matches!(value, Value::Boolean(_))
}

fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Integer(_))
}

fn is_float(value: &Value) -> bool {
    matches!(value, Value::Float(_))
}

fn is_string(value: &Value) -> bool {
    matches!(value, Value::String(_))
}

fn is_list(value: &Value) -> bool {
    matches!(value, Value::List(_))
}

/// Upper-cased leading keyword of a string that looks like WKT.
fn wkt_keyword(value: &Value) -> Option<String> {
    let text = value.as_str()?.trim_start();
    let end = text
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(text.len());
    let (keyword, rest) = text.split_at(end);
    let rest = rest.trim_start();
    if rest.starts_with('(') || rest.eq_ignore_ascii_case("EMPTY") {
        Some(keyword.to_ascii_uppercase())
    } else {
        None
    }
}

fn is_wkt_point(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("POINT")
}

fn is_wkt_linestring(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("LINESTRING")
}

fn is_wkt_polygon(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("POLYGON")
}

fn is_wkt_multipoint(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("MULTIPOINT")
}

fn is_wkt_multilinestring(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("MULTILINESTRING")
}

fn is_wkt_multipolygon(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("MULTIPOLYGON")
}

fn is_wkt_collection(value: &Value) -> bool {
    wkt_keyword(value).as_deref() == Some("GEOMETRYCOLLECTION")
}

fn is_date_time(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| OffsetDateTime::parse(s.trim(), &Rfc3339).is_ok())
}

fn is_date(value: &Value) -> bool {
    let format = format_description!("[year]-[month]-[day]");
    value
        .as_str()
        .is_some_and(|s| Date::parse(s.trim(), &format).is_ok())
}

/// A named computation over zero or more argument expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    name: String,
    arguments: Vec<Expression>,
}

impl Function {
    pub const DEFAULT_VALIDATORS: &'static [Validator] = &[validate_property_name];

    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_validators(name, Vec::<Node>::new(), Self::DEFAULT_VALIDATORS)
    }

    pub fn with_arguments<I, N>(name: impl Into<String>, arguments: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        Self::with_validators(name, arguments, Self::DEFAULT_VALIDATORS)
    }

    pub fn with_validators<I, N>(
        name: impl Into<String>,
        arguments: I,
        validators: &[Validator],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let name = name.into();
        validators::apply(validators, &name)?;
        let mut function = Self {
            name,
            arguments: Vec::new(),
        };
        for argument in arguments {
            function.add_argument(argument)?;
        }
        Ok(function)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arguments(&self) -> &[Expression] {
        &self.arguments
    }

    pub fn add_argument(&mut self, argument: impl Into<Node>) -> Result<()> {
        let argument = node::expect_expression(argument.into())?;
        self.arguments.push(argument);
        Ok(())
    }

    /// Remove the first argument equal to `argument`.
    pub fn remove_argument(&mut self, argument: &Expression) -> Option<Expression> {
        let index = self.arguments.iter().position(|a| a == argument)?;
        Some(self.arguments.remove(index))
    }
}
