use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVES: [&str; 3] = ["judge_runner=info", "hyper=warn", "reqwest=warn"];

/// `RUST_LOG` wins when set; the built-in directives only apply without it.
fn build_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(spec) = rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        return EnvFilter::try_new(spec)
            .with_context(|| format!("Invalid {} value '{}'", EnvFilter::DEFAULT_ENV, spec));
    }

    let mut filter = EnvFilter::default();
    for directive in DEFAULT_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

/// Install the global subscriber: console output plus a plain-text copy in
/// `log_file`, which is truncated on every run.
pub fn init(log_file: &Path) -> Result<()> {
    let file = File::create(log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(build_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        )?)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}
