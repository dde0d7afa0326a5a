//! Generator CLI entrypoint.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scm-plugin-specgen")]
#[command(author, version, about = "Generate SCM plugin method definitions from an OpenAPI document", long_about = None)]
struct Cli {
    /// Path to the OpenAPI document (YAML or JSON)
    #[arg(long)]
    spec: PathBuf,

    /// Output directory for the generated artifacts
    #[arg(long)]
    out: PathBuf,

    /// Provider key the generated endpoints carry (base-URL lookup and
    /// credential routing)
    #[arg(long, default_value = "github")]
    provider: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let spec = scm_plugin_specgen::document::load(&cli.spec)
        .with_context(|| format!("loading {}", cli.spec.display()))?;
    let generated = scm_plugin_specgen::generate(&spec, &cli.provider)?;

    for warning in &generated.warnings {
        eprintln!("warning: {warning}");
    }

    scm_plugin_specgen::write_artifacts(&generated, &cli.out)
        .with_context(|| format!("writing artifacts to {}", cli.out.display()))?;

    let methods = generated
        .methods_list
        .as_array()
        .map_or(0, std::vec::Vec::len);
    println!(
        "Generated {methods} methods in {} ({} warnings)",
        cli.out.display(),
        generated.warnings.len()
    );

    Ok(())
}
