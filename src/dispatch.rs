//! Picking the syntax a filter is written in.
//!
//! Registered parsers are tried in order. A parser that answers
//! [`FesError::SyntaxMismatch`] hands the input on to the next one; any
//! other error means the syntax applied and the input is bad, so it is
//! returned as is.

use tracing::{debug, error, warn};

use crate::config::{ParserConfig, Syntax};
use crate::cql::CqlParser;
use crate::error::{FesError, Result};
use crate::model::Filter;
use crate::xml::{FesXmlParser, SchemaValidator};

/// One filter syntax.
pub trait SyntaxParser {
    fn name(&self) -> &'static str;

    fn parse(&self, input: &str) -> Result<Filter>;
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn SyntaxParser + Send + Sync>>,
}

impl Default for ParserRegistry {
    /// fes XML, then CQL. No schema gate.
    fn default() -> Self {
        Self {
            parsers: vec![Box::new(FesXmlParser::new()), Box::new(CqlParser)],
        }
    }
}

impl ParserRegistry {
    /// An empty registry; see [`ParserRegistry::register`].
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    pub fn from_config(config: &ParserConfig) -> Result<Self> {
        let schema = match (&config.schema_path, config.validate_schema) {
            (Some(path), true) => Some(SchemaValidator::load(path)?),
            (None, true) => {
                warn!("schema validation requested but no schema path is configured");
                None
            }
            (_, false) => None,
        };

        let mut registry = Self::new();
        for syntax in &config.syntaxes {
            match syntax {
                Syntax::FesXml => {
                    let parser = match &schema {
                        Some(schema) => FesXmlParser::new().with_schema(schema.clone()),
                        None => FesXmlParser::new(),
                    };
                    registry.register(parser);
                }
                Syntax::Cql => registry.register(CqlParser),
            }
        }
        Ok(registry)
    }

    /// Append a parser; it is tried after the ones already registered.
    pub fn register(&mut self, parser: impl SyntaxParser + Send + Sync + 'static) {
        self.parsers.push(Box::new(parser));
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    pub fn parse(&self, input: &str) -> Result<Filter> {
        let mut failures = Vec::with_capacity(self.parsers.len());
        for parser in &self.parsers {
            debug!(syntax = parser.name(), "trying syntax");
            match parser.parse(input) {
                Ok(filter) => return Ok(filter),
                Err(err) if err.is_syntax_mismatch() => {
                    debug!(syntax = parser.name(), error = %err, "syntax does not apply");
                    failures.push(err.to_string());
                }
                Err(err) => return Err(err),
            }
        }

        error!(tried = ?self.names(), "no registered syntax accepted the input");
        let detail = if failures.is_empty() {
            "no syntax parsers are registered".to_string()
        } else {
            failures.join("; ")
        };
        Err(FesError::parse(format!("could not parse filter: {detail}")))
    }
}

/// Parse `input` as fes XML or, failing that, CQL.
pub fn parse_filter(input: &str) -> Result<Filter> {
    ParserRegistry::default().parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BinaryComparisonName, BinaryComparisonOperator, Literal, ValueReference};

    struct Failing;

    impl SyntaxParser for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn parse(&self, _input: &str) -> Result<Filter> {
            Err(FesError::Unsupported("always".into()))
        }
    }

    fn depth_below_30() -> Filter {
        Filter::new(
            BinaryComparisonOperator::new(
                BinaryComparisonName::PropertyIsLessThan,
                ValueReference::new("DEPTH").unwrap(),
                Literal::new("30"),
            )
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn falls_through_to_cql() {
        assert_eq!(parse_filter("DEPTH < 30").unwrap(), depth_below_30());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        match parse_filter("garbage ~") {
            Err(FesError::Parse(message)) => {
                assert!(message.contains("fes-xml"));
                assert!(message.contains("cql"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn applicable_syntax_errors_are_not_masked() {
        let mut registry = ParserRegistry::new();
        registry.register(Failing);
        registry.register(CqlParser);
        assert!(matches!(
            registry.parse("DEPTH < 30"),
            Err(FesError::Unsupported(_))
        ));
    }

    #[test]
    fn empty_registry_fails_explicitly() {
        assert!(matches!(
            ParserRegistry::new().parse("DEPTH < 30"),
            Err(FesError::Parse(_))
        ));
    }

    #[test]
    fn configured_order() {
        let config = ParserConfig {
            schema_path: None,
            validate_schema: false,
            syntaxes: vec![Syntax::Cql],
        };
        let registry = ParserRegistry::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec!["cql"]);
        assert!(registry.parse("<fes:Filter/>").is_err());
    }
}
