use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{FesError, Result};
use crate::xml::schema::SCHEMA_PATH_ENV;

/// A filter syntax the registry can try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Syntax {
    FesXml,
    Cql,
}

impl FromStr for Syntax {
    type Err = FesError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fes-xml" | "xml" => Ok(Syntax::FesXml),
            "cql" => Ok(Syntax::Cql),
            _ => Err(FesError::Config(format!("invalid syntax: {value}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// XSD used when `validate_schema` is set.
    pub schema_path: Option<PathBuf>,
    pub validate_schema: bool,
    /// Tried in this order.
    pub syntaxes: Vec<Syntax>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            schema_path: std::env::var_os(SCHEMA_PATH_ENV)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            validate_schema: false,
            syntaxes: vec![Syntax::FesXml, Syntax::Cql],
        }
    }
}

impl ParserConfig {
    /// Defaults, overlaid by the YAML file at `path` (if any), overlaid by
    /// `FES_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }
        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("FES")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("syntaxes"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
