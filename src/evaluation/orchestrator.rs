use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, warn, Instrument};

use super::aggregator::ResultAggregator;
use super::pipeline::CasePipeline;
use super::pipeline::CaseOutcome;
use super::types::{JudgeVerdict, ResultRow, SolverOutcome};
use crate::case::Case;
use crate::config::DEFAULT_MAX_CONCURRENT;
use crate::metrics::Metrics;
use crate::report::Reporter;

/// Fans cases out over a bounded set of workers and waits for all of them.
pub struct Orchestrator {
    pipeline: Arc<CasePipeline>,
    metrics: Arc<Metrics>,
    max_concurrent: usize,
}

impl Orchestrator {
    pub fn new(pipeline: CasePipeline, metrics: Arc<Metrics>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// A limit of zero is treated as one; anything above what a semaphore can
    /// hold is capped there.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Run every case and return the rows sorted by case id.
    ///
    /// Per-case failures end up as failing rows. Errors come from the reporter
    /// consuming the finished batch.
    pub async fn run_batch(
        &self,
        cases: Vec<Case>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Vec<ResultRow>> {
        let run_id = uuid::Uuid::new_v4();
        let total = cases.len();
        let aggregator = Arc::new(ResultAggregator::new(total));
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        info!(
            run_id = %run_id,
            total_cases = %total,
            max_concurrent = %self.max_concurrent,
            "Batch started"
        );

        let span = info_span!("batch", run_id = %run_id);
        let mut handles = Vec::with_capacity(total);

        for case in cases {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Batch semaphore closed")?;
            let case = Arc::new(case);
            let pipeline = self.pipeline.clone();
            let metrics = self.metrics.clone();
            let aggregator = aggregator.clone();
            let reporter = reporter.clone();
            let task_case = case.clone();

            let handle = tokio::spawn(
                async move {
                    let _permit = permit;
                    let result = pipeline.run(&task_case).await;
                    metrics.record_case(result.outcome, result.execution_time_ms);
                    aggregator.record(result.row, |done, total| reporter.on_progress(done, total));
                }
                .instrument(span.clone()),
            );

            handles.push((case, handle));
        }

        for (case, handle) in handles {
            if let Err(e) = handle.await {
                error!(run_id = %run_id, case_id = %case.id, error = %e, "Case task panicked");
                if !aggregator.contains(&case.id) {
                    let row = ResultRow::new(
                        &case,
                        &SolverOutcome::Error(e.to_string()),
                        JudgeVerdict::internal_failure(&e),
                    );
                    self.metrics.record_case(CaseOutcome::Aborted, 0);
                    aggregator.record(row, |done, total| reporter.on_progress(done, total));
                }
            }
        }

        if aggregator.completed() != aggregator.total() {
            warn!(
                run_id = %run_id,
                completed = %aggregator.completed(),
                total_cases = %aggregator.total(),
                "Batch finished with missing rows"
            );
        }

        let rows = aggregator.take_sorted();
        let passed = rows.iter().filter(|r| r.pass).count();
        info!(
            run_id = %run_id,
            total_cases = %total,
            passed = %passed,
            failed = %(rows.len() - passed),
            elapsed_ms = %aggregator.elapsed_ms(),
            "Batch completed"
        );

        reporter
            .on_batch_complete(&rows)
            .context("Reporter failed to consume the finished batch")?;

        Ok(rows)
    }
}
