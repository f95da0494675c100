//! Recursive-descent parser for CQL.
//!
//! Grammar (in rough EBNF):
//!
//! search_condition = boolean_term ("OR" boolean_term)*
//! boolean_term     = boolean_factor ("AND" boolean_factor)*
//! boolean_factor   = ["NOT"] boolean_primary
//! boolean_primary  = "(" search_condition ")" | predicate
//! predicate        = spatial_predicate
//!                  | operand compare_op operand
//!                  | operand ["NOT"] "LIKE" STRING
//!                  | operand ["NOT"] "BETWEEN" operand "AND" operand
//!                  | operand "IS" ["NOT"] "NULL"
//! compare_op       = "=" | "<>" | "<" | "<=" | ">" | ">="
//! operand          = IDENT ["(" [operand ("," operand)*] ")"] | NUMBER | STRING
//! spatial_predicate
//!                  = SPATIAL_OP "(" operand "," (GEOMETRY | operand) ")"
//!                  | "BBOX" "(" operand "," NUMBER "," NUMBER "," NUMBER "," NUMBER ["," STRING] ")"
//!                  | DISTANCE_OP "(" operand "," GEOMETRY "," NUMBER "," (IDENT | STRING) ")"
//!
//! Grammar failures are reported as `SyntaxMismatch`; errors raised while
//! building a node from a matched production propagate unchanged.

use super::lexer::{Token, tokenize};
use crate::error::{FesError, Result};
use crate::model::{
    BetweenComparisonOperator, BinaryComparisonName, BinaryComparisonOperator, BinaryLogicOperator,
    BinaryLogicType, BinarySpatialOperator, Boundary, Distance, DistanceOperator,
    DistanceOperatorName, Filter, Function, Geometry, LikeOperator, Literal, Node, NullOperator,
    SpatialOperatorName, UnaryLogicOperator, Value, ValueReference,
};

pub const SYNTAX: &str = "cql";

// CQL pattern tokens for PropertyIsLike.
const WILD_CARD: &str = "%";
const SINGLE_CHAR: &str = "_";
const ESCAPE_CHAR: &str = "\\";

fn mismatch(reason: impl Into<String>) -> FesError {
    FesError::SyntaxMismatch {
        syntax: SYNTAX,
        reason: reason.into(),
    }
}

fn comparison_name(token: &Token) -> Option<BinaryComparisonName> {
    match token {
        Token::Eq => Some(BinaryComparisonName::PropertyIsEqualTo),
        Token::Ne => Some(BinaryComparisonName::PropertyIsNotEqualTo),
        Token::Lt => Some(BinaryComparisonName::PropertyIsLessThan),
        Token::Le => Some(BinaryComparisonName::PropertyIsLessThanOrEqualTo),
        Token::Gt => Some(BinaryComparisonName::PropertyIsGreaterThan),
        Token::Ge => Some(BinaryComparisonName::PropertyIsGreaterThanOrEqualTo),
        _ => None,
    }
}

enum SpatialKeyword {
    Binary(SpatialOperatorName),
    Distance(DistanceOperatorName),
}

fn spatial_keyword(ident: &str) -> Option<SpatialKeyword> {
    if let Some(name) = SpatialOperatorName::ALL
        .iter()
        .find(|name| name.as_str().eq_ignore_ascii_case(ident))
    {
        return Some(SpatialKeyword::Binary(*name));
    }
    DistanceOperatorName::ALL
        .iter()
        .find(|name| name.as_str().eq_ignore_ascii_case(ident))
        .map(|name| SpatialKeyword::Distance(*name))
}

/// Pass a lone operand through; combine two or more into an And/Or.
fn combine(operator_type: BinaryLogicType, mut operands: Vec<Node>) -> Result<Node> {
    if operands.len() == 1 {
        return Ok(operands.remove(0));
    }
    Ok(BinaryLogicOperator::from_operands(operator_type, operands)?.into())
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        let tok = self.advance();
        if tok == expected {
            Ok(())
        } else {
            Err(mismatch(format!("expected {expected:?}, got {tok:?}")))
        }
    }

    fn parse_search_condition(&mut self) -> Result<Node> {
        let mut terms = vec![self.parse_boolean_term()?];
        while self.eat(&Token::Or) {
            terms.push(self.parse_boolean_term()?);
        }
        combine(BinaryLogicType::Or, terms)
    }

    fn parse_boolean_term(&mut self) -> Result<Node> {
        let mut factors = vec![self.parse_boolean_factor()?];
        while self.eat(&Token::And) {
            factors.push(self.parse_boolean_factor()?);
        }
        combine(BinaryLogicType::And, factors)
    }

    fn parse_boolean_factor(&mut self) -> Result<Node> {
        if self.eat(&Token::Not) {
            let inner = self.parse_boolean_primary()?;
            return Ok(UnaryLogicOperator::not(inner)?.into());
        }
        self.parse_boolean_primary()
    }

    fn parse_boolean_primary(&mut self) -> Result<Node> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_search_condition()?;
            self.expect(Token::RParen)?;
            return Ok(inner);
        }
        self.parse_predicate()
    }

    fn parse_predicate(&mut self) -> Result<Node> {
        if let (Token::Ident(name), Token::LParen) = (self.peek(), self.peek_at(1)) {
            if let Some(keyword) = spatial_keyword(name) {
                self.pos += 2;
                return match keyword {
                    SpatialKeyword::Binary(SpatialOperatorName::BBOX) => self.parse_bbox(),
                    SpatialKeyword::Binary(name) => self.parse_binary_spatial(name),
                    SpatialKeyword::Distance(name) => self.parse_distance(name),
                };
            }
        }

        let first = self.parse_operand()?;

        if let Some(name) = comparison_name(self.peek()) {
            self.advance();
            let second = self.parse_operand()?;
            return Ok(BinaryComparisonOperator::new(name, first, second)?.into());
        }

        let negated = self.eat(&Token::Not);
        let predicate: Node = match self.advance() {
            Token::Like => match self.advance() {
                Token::Str(pattern) => LikeOperator::new(first, Literal::new(pattern))?
                    .with_pattern_tokens(WILD_CARD, SINGLE_CHAR, ESCAPE_CHAR)
                    .into(),
                other => return Err(mismatch(format!("expected pattern after LIKE, got {other:?}"))),
            },
            Token::Between => {
                let lower = self.parse_operand()?;
                self.expect(Token::And)?;
                let upper = self.parse_operand()?;
                BetweenComparisonOperator::new(first, Boundary::lower(lower)?, Boundary::upper(upper)?)?
                    .into()
            }
            Token::Is if !negated => {
                let is_not = self.eat(&Token::Not);
                self.expect(Token::Null)?;
                let null: Node = NullOperator::new(first)?.into();
                if is_not {
                    UnaryLogicOperator::not(null)?.into()
                } else {
                    null
                }
            }
            other => return Err(mismatch(format!("expected a predicate operator, got {other:?}"))),
        };

        if negated {
            Ok(UnaryLogicOperator::not(predicate)?.into())
        } else {
            Ok(predicate)
        }
    }

    fn parse_operand(&mut self) -> Result<Node> {
        match self.advance() {
            Token::Ident(name) => {
                if !self.eat(&Token::LParen) {
                    return Ok(ValueReference::new(name)?.into());
                }
                let mut arguments = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        arguments.push(self.parse_operand()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                Ok(Function::with_arguments(name, arguments)?.into())
            }
            Token::Number(text) | Token::Str(text) => Ok(Literal::new(Value::String(text)).into()),
            other => Err(mismatch(format!("expected an operand, got {other:?}"))),
        }
    }

    fn parse_binary_spatial(&mut self, name: SpatialOperatorName) -> Result<Node> {
        let property = self.parse_operand()?;
        self.expect(Token::Comma)?;
        let second = match self.peek().clone() {
            Token::Geometry(wkt) => {
                self.advance();
                Node::from(Geometry::from_wkt(wkt)?)
            }
            _ => self.parse_operand()?,
        };
        self.expect(Token::RParen)?;
        Ok(BinarySpatialOperator::new(name, property, second)?.into())
    }

    fn parse_bbox(&mut self) -> Result<Node> {
        let property = self.parse_operand()?;
        let mut corners = [0.0f64; 4];
        for corner in corners.iter_mut() {
            self.expect(Token::Comma)?;
            *corner = self.parse_number()?;
        }
        let srs_name = if self.eat(&Token::Comma) {
            match self.advance() {
                Token::Str(srs) => Some(srs),
                other => return Err(mismatch(format!("expected a CRS string, got {other:?}"))),
            }
        } else {
            None
        };
        self.expect(Token::RParen)?;

        let [minx, miny, maxx, maxy] = corners;
        let mut envelope = Geometry::from_wkt(format!(
            "POLYGON (({minx} {miny}, {maxx} {miny}, {maxx} {maxy}, {minx} {maxy}, {minx} {miny}))"
        ))?;
        if let Some(srs_name) = srs_name {
            envelope = envelope.with_srs_name(srs_name);
        }
        Ok(BinarySpatialOperator::new(SpatialOperatorName::BBOX, property, envelope)?.into())
    }

    fn parse_distance(&mut self, name: DistanceOperatorName) -> Result<Node> {
        let property = self.parse_operand()?;
        self.expect(Token::Comma)?;
        let geometry = match self.advance() {
            Token::Geometry(wkt) => Geometry::from_wkt(wkt)?,
            other => return Err(mismatch(format!("expected a WKT geometry, got {other:?}"))),
        };
        self.expect(Token::Comma)?;
        let distance = self.parse_number()?;
        self.expect(Token::Comma)?;
        let units = match self.advance() {
            Token::Ident(units) | Token::Str(units) => units,
            other => return Err(mismatch(format!("expected distance units, got {other:?}"))),
        };
        self.expect(Token::RParen)?;
        Ok(DistanceOperator::new(name, property, geometry, Distance::new(distance, units))?.into())
    }

    fn parse_number(&mut self) -> Result<f64> {
        match self.advance() {
            Token::Number(text) => text
                .parse()
                .map_err(|_| FesError::parse(format!("{text:?} is not a number"))),
            other => Err(mismatch(format!("expected a number, got {other:?}"))),
        }
    }
}

/// Parse a CQL string into the filter tree.
pub fn parse(input: &str) -> Result<Filter> {
    let input = input.trim();
    if input.is_empty() {
        return Err(mismatch("empty input"));
    }

    let tokens = tokenize(input).map_err(mismatch)?;
    let mut parser = Parser::new(tokens);
    let root = parser.parse_search_condition()?;

    if !matches!(parser.peek(), Token::Eof) {
        return Err(mismatch(format!(
            "unexpected token after expression: {:?}",
            parser.peek()
        )));
    }

    Filter::new(root)
}
