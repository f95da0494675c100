//! OGC Filter Encoding 2.0 filters: a typed filter tree, a `fes:Filter` XML
//! parser and serializer, a CQL parser and a dispatcher that accepts either
//! syntax.
//!
//! ```no_run
//! let filter = ogcfilter::parse_filter("DEPTH < 30")?;
//! let xml = ogcfilter::FesXmlSerializer::new().serialize(filter)?;
//! # Ok::<(), ogcfilter::FesError>(())
//! ```

pub mod config;
pub mod cql;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod validators;
pub mod xml;

pub use config::{ParserConfig, Syntax};
pub use cql::CqlParser;
pub use dispatch::{ParserRegistry, SyntaxParser, parse_filter};
pub use error::{FesError, Result};
pub use model::{
    Expression, Filter, Function, Literal, Node, NodeKind, Operator, Value, ValueReference,
};
pub use xml::{FesXmlParser, FesXmlSerializer, SchemaValidator};
