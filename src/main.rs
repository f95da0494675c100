mod app;

use anyhow::{Context, Result};
use clap::Parser;

use app::{Cli, output_format_label, parse, parser_config, read_filter, render};
use ogcfilter::ParserRegistry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = parser_config(&cli)?;
    let registry =
        ParserRegistry::from_config(&config).context("CLI: Failed to set up filter parsers")?;
    tracing::info!(
        "Syntaxes: {} (schema validation: {})",
        registry.names().join(", "),
        config.validate_schema
    );

    let text = read_filter(&cli)?;
    let filter = parse(&registry, &text)?;
    tracing::info!(
        "Parsed {} filter, writing {}",
        filter.predicate().element_name(),
        output_format_label(&cli.format)
    );

    println!("{}", render(filter, cli.format, cli.pretty)?);
    Ok(())
}
