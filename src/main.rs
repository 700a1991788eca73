use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, bail};
use vecpipe::{Component, RuntimeConfig, default_registry, encode_lines, init_tracing, load_encoder};

const USAGE: &str = "usage: vecpipe <component.yml | component.bin> [runtime.yml]";

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args_os().skip(1);
    let Some(component_path) = args.next().map(PathBuf::from) else {
        bail!(USAGE);
    };
    let config = match args.next() {
        Some(path) => RuntimeConfig::from_file(&path)
            .with_context(|| format!("loading runtime config {}", PathBuf::from(&path).display()))?,
        None => RuntimeConfig::default(),
    };
    if args.next().is_some() {
        bail!(USAGE);
    }

    init_tracing(&config)?;

    let registry = default_registry(config.handle_settings());
    let mut encoder = load_encoder(&registry, &component_path)
        .with_context(|| format!("loading component {}", component_path.display()))?;

    let scope = encoder.scope();
    let stdin = io::stdin().lock();
    let stdout = BufWriter::new(io::stdout().lock());
    let written = encode_lines(&scope, stdin, stdout)?;
    scope.finish()?;

    tracing::info!(lines = written, "vecpipe_done");
    Ok(())
}
