use std::path::PathBuf;

use clap::Parser;
use vitrine::{App, Catalog, Options, VitrineError};

/// Browse and inspect glTF models.
#[derive(Debug, Parser)]
#[command(name = "vitrine", version, about)]
struct Cli {
    /// Catalog file (`.toml` or `.json`) listing the carousel models.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Options preset (`.toml`).
    #[arg(long)]
    options: Option<PathBuf>,

    /// Model path or URL to show first.
    #[arg(long)]
    model: Option<String>,
}

fn run(cli: Cli) -> Result<(), VitrineError> {
    let catalog = match &cli.catalog {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };
    let options = match &cli.options {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    log::info!("{} models in catalog", catalog.len());

    let mut builder = App::builder().with_catalog(catalog).with_options(options);
    if let Some(model) = cli.model {
        builder = builder.with_initial_model(model);
    }
    builder.build()?.run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
