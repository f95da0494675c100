//! OGC Common Query Language (CQL) front end.
//!
//! Syntax:
//!   DEPTH < 30                          - comparison (= <> < <= > >=)
//!   name LIKE 'Ab%'                     - pattern match (% any, _ one, \ escape)
//!   depth BETWEEN 1 AND 10              - inclusive range
//!   name IS [NOT] NULL                  - existence
//!   strToUpperCase(name) = 'BOB'        - function calls
//!   INTERSECTS(geom, POINT (1 2))       - binary spatial predicates
//!   BBOX(geom, minx, miny, maxx, maxy)  - envelope test
//!   DWITHIN(geom, POINT (1 2), 10, m)   - distance buffers
//!   a AND b, a OR b, NOT a, (a)         - boolean structure (AND binds tighter)

mod lexer;
mod parser;

pub use parser::{SYNTAX, parse};

use crate::dispatch::SyntaxParser;
use crate::error::Result;
use crate::model::Filter;

/// CQL as a registered syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct CqlParser;

impl SyntaxParser for CqlParser {
    fn name(&self) -> &'static str {
        SYNTAX
    }

    fn parse(&self, input: &str) -> Result<Filter> {
        parse(input)
    }
}
