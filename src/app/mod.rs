use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::{Path, PathBuf};

use ogcfilter::{FesXmlSerializer, Filter, ParserConfig, ParserRegistry};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Filter text (fes XML or CQL); read from --input or stdin if omitted
    pub filter: Option<String>,

    /// Read the filter from a file ("-" for stdin)
    #[arg(short, long, conflicts_with = "filter")]
    pub input: Option<PathBuf>,

    /// Parser configuration file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// XML Schema to validate fes XML against
    #[arg(long, env = "FES_SCHEMA_PATH")]
    pub schema: Option<PathBuf>,

    /// Validate fes XML input against the schema
    #[arg(long)]
    pub validate: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "xml")]
    pub format: OutputFormat,

    /// Indent XML and JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum OutputFormat {
    Xml,
    Json,
    Debug,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::Xml => "xml",
        OutputFormat::Json => "json",
        OutputFormat::Debug => "debug",
    }
}

/// Config file and environment, then command-line overrides.
pub fn parser_config(cli: &Cli) -> Result<ParserConfig> {
    let mut config = ParserConfig::load(cli.config.as_deref())
        .with_context(|| match &cli.config {
            Some(path) => format!("CLI: Failed to load config {path:?}"),
            None => "CLI: Failed to load config from environment".to_string(),
        })?;
    if let Some(schema) = &cli.schema {
        config.schema_path = Some(schema.clone());
    }
    if cli.validate {
        if config.schema_path.is_none() {
            bail!("CLI: --validate needs a schema; pass --schema or set FES_SCHEMA_PATH");
        }
        config.validate_schema = true;
    }
    Ok(config)
}

pub fn read_filter(cli: &Cli) -> Result<String> {
    if let Some(filter) = &cli.filter {
        return Ok(filter.clone());
    }
    match cli.input.as_deref() {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("CLI: Failed to read filter from {path:?}")),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("CLI: Failed to read filter from stdin")?;
            Ok(text)
        }
    }
}

pub fn parse(registry: &ParserRegistry, text: &str) -> Result<Filter> {
    let text = text.trim();
    if text.is_empty() {
        bail!("CLI: No filter given");
    }
    registry.parse(text).context("Parse: Failed to parse filter")
}

pub fn render(filter: Filter, format: OutputFormat, pretty: bool) -> Result<String> {
    match format {
        OutputFormat::Xml => FesXmlSerializer::new()
            .pretty(pretty)
            .serialize(filter)
            .context("Output: Failed to serialize filter as fes XML"),
        OutputFormat::Json if pretty => serde_json::to_string_pretty(&filter)
            .context("Output: Failed to serialize filter as JSON"),
        OutputFormat::Json => {
            serde_json::to_string(&filter).context("Output: Failed to serialize filter as JSON")
        }
        OutputFormat::Debug if pretty => Ok(format!("{filter:#?}")),
        OutputFormat::Debug => Ok(format!("{filter:?}")),
    }
}
