use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use super::types::ResultRow;

struct BatchState {
    rows: BTreeMap<String, ResultRow>,
    completed: usize,
}

/// Collects rows from concurrent workers and hands them back ordered by case id.
pub struct ResultAggregator {
    total: usize,
    started_at: Instant,
    state: Mutex<BatchState>,
}

impl ResultAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            started_at: Instant::now(),
            state: Mutex::new(BatchState {
                rows: BTreeMap::new(),
                completed: 0,
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.state.lock().completed
    }

    pub fn contains(&self, case_id: &str) -> bool {
        self.state.lock().rows.contains_key(case_id)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Store a finished row and report the new completion count.
    ///
    /// `on_progress` runs while the store is locked, so observers see counts
    /// in strictly increasing order.
    pub fn record<F>(&self, row: ResultRow, on_progress: F) -> usize
    where
        F: FnOnce(usize, usize),
    {
        let mut state = self.state.lock();
        let id = row.id.clone();
        if state.rows.insert(id.clone(), row).is_some() {
            warn!(case_id = %id, "Row recorded twice; keeping the latest");
        }
        state.completed += 1;
        let completed = state.completed;

        debug!(
            case_id = %id,
            completed = %completed,
            total = %self.total,
            "Recorded result"
        );
        on_progress(completed, self.total);
        completed
    }

    /// Take every collected row, sorted ascending by case id.
    pub fn take_sorted(&self) -> Vec<ResultRow> {
        let rows = std::mem::take(&mut self.state.lock().rows);
        rows.into_values().collect()
    }
}
