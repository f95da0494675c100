//! Validators for the primitive leaf values of a filter tree.
//!
//! Every validator has the same shape, `fn(&str) -> Result<()>`, so any
//! field can carry an ordered list of them. [`apply`] runs such a list and
//! stops at the first failure.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited, opt, separated};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::error::{FesError, Result};

pub type Validator = fn(&str) -> Result<()>;

/// Keywords a WKT geometry may start with.
pub const WKT_KEYWORDS: &[&str] = &[
    "POINT",
    "LINESTRING",
    "POLYGON",
    "MULTIPOINT",
    "MULTILINESTRING",
    "MULTIPOLYGON",
    "GEOMETRYCOLLECTION",
    "CIRCULARSTRING",
    "COMPOUNDCURVE",
    "CURVEPOLYGON",
    "MULTICURVE",
    "MULTISURFACE",
    "CURVE",
    "SURFACE",
    "POLYHEDRALSURFACE",
    "TIN",
    "TRIANGLE",
];

// Same alias the CQL lexer uses.
type PResult<T> = std::result::Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Run `validators` against `value` in registration order.
pub fn apply(validators: &[Validator], value: &str) -> Result<()> {
    validators.iter().try_for_each(|validator| validator(value))
}

fn ncname<'i>(input: &mut &'i str) -> PResult<&'i str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
        }),
    )
        .take()
        .parse_next(input)
}

fn qname<'i>(input: &mut &'i str) -> PResult<&'i str> {
    (ncname, opt((':', ncname))).take().parse_next(input)
}

/// `[3]` or `[gml:name='x']`
fn step_predicate<'i>(input: &mut &'i str) -> PResult<&'i str> {
    delimited(
        '[',
        alt((digit1, take_while(1.., |c: char| c != ']' && c != '['))),
        ']',
    )
    .parse_next(input)
}

fn location_step<'i>(input: &mut &'i str) -> PResult<&'i str> {
    (opt('@'), qname, opt(step_predicate))
        .take()
        .parse_next(input)
}

fn location_path(input: &mut &str) -> PResult<()> {
    separated(1.., location_step, '/').parse_next(input)
}

/// Property names follow GML naming: a qualified XML name, optionally a
/// relative path of such names with `@attribute` steps and `[n]` predicates.
pub fn validate_property_name(value: &str) -> Result<()> {
    let mut input = value;
    match location_path.parse_next(&mut input) {
        Ok(()) if input.is_empty() => Ok(()),
        _ => Err(FesError::validation(format!(
            "{value:?} is not a valid property name"
        ))),
    }
}

/// Shallow check: the value must start with a WKT geometry keyword.
pub fn validate_wkt(value: &str) -> Result<()> {
    let upper = value.trim_start().to_ascii_uppercase();
    if WKT_KEYWORDS.iter().any(|keyword| upper.starts_with(keyword)) {
        Ok(())
    } else {
        Err(FesError::validation(format!(
            "{value:?} does not start with a WKT geometry keyword"
        )))
    }
}

pub fn validate_resource_identifier(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(FesError::validation("resource identifier is empty"));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '<' | '>' | '"' | '&'))
    {
        return Err(FesError::validation(format!(
            "resource identifier {value:?} contains {bad:?}"
        )));
    }
    Ok(())
}

/// GML time positions: RFC 3339 date-times, plain dates, or date-times
/// without an offset.
pub fn validate_time_position(value: &str) -> Result<()> {
    parse_time_position(value).map(|_| ())
}

/// The instant a time position names. Dates are read as midnight and
/// positions without an offset as UTC.
pub fn parse_time_position(value: &str) -> Result<OffsetDateTime> {
    let value = value.trim();
    let date = format_description!("[year]-[month]-[day]");
    let local = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let local_subsecond =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

    OffsetDateTime::parse(value, &Rfc3339)
        .or_else(|_| Date::parse(value, &date).map(|d| d.midnight().assume_utc()))
        .or_else(|_| PrimitiveDateTime::parse(value, &local).map(PrimitiveDateTime::assume_utc))
        .or_else(|_| {
            PrimitiveDateTime::parse(value, &local_subsecond).map(PrimitiveDateTime::assume_utc)
        })
        .map_err(|_| FesError::validation(format!("{value:?} is not a valid time position")))
}
