mod case;
mod config;
mod error;
mod evaluation;
mod logging;
mod metrics;
mod openai;
mod report;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use evaluation::{CasePipeline, Orchestrator};
use openai::{OpenAiClient, OpenAiJudge, OpenAiSolver};
use report::{CompositeReporter, ConsoleReporter, CsvReporter, Reporter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::Config::from_env();
    logging::init(&config.log_file)?;
    config.print_banner();

    let api_key = config.require_api_key()?;
    let cases = case::load_cases(&config.cases_file)
        .with_context(|| format!("Failed to load cases from {}", config.cases_file.display()))?;
    if cases.is_empty() {
        warn!("No test cases found in {}", config.cases_file.display());
    }

    let client = Arc::new(OpenAiClient::new(&config, api_key)?);
    let pipeline = CasePipeline::new(
        Arc::new(OpenAiSolver::new(client.clone(), &config)),
        Arc::new(OpenAiJudge::new(client, &config)),
    )
    .with_style_enforcement(config.enforce_style_consistency);

    let metrics_store = metrics::Metrics::new();
    let orchestrator = Orchestrator::new(pipeline, metrics_store.clone())
        .with_max_concurrent(config.max_concurrent_cases);

    let reporters: Vec<Box<dyn Reporter>> = vec![
        Box::new(ConsoleReporter),
        Box::new(CsvReporter::new(config.results_csv.clone())),
    ];
    let reporter: Arc<dyn Reporter> = Arc::new(CompositeReporter::new(reporters));

    let started_at = chrono::Utc::now();
    info!(
        started_at = %started_at.to_rfc3339(),
        cases = %cases.len(),
        "Loaded {} test cases",
        cases.len()
    );

    orchestrator.run_batch(cases, reporter).await?;

    let elapsed = chrono::Utc::now() - started_at;
    info!(
        elapsed_secs = %elapsed.num_seconds(),
        "{}",
        metrics_store.render_summary()
    );
    Ok(())
}
