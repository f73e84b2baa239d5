use async_trait::async_trait;

use crate::case::Case;
use crate::error::StageError;

/// Produces a candidate answer for a case. Called concurrently from
/// independent workers.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn solve(&self, case: &Case) -> Result<String, StageError>;
}

/// Grades a candidate answer. Returns the raw verdict payload; parsing is the
/// pipeline's job.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, case: &Case, answer: &str) -> Result<String, StageError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    pub const PASS_PAYLOAD: &str =
        r#"{"pass": true, "reason": "Correct and complete.", "style_label": "Complete", "correct_math": true}"#;

    /// Tracks how many adapter calls are in flight at once.
    #[derive(Default)]
    pub struct ConcurrencyGauge {
        current: AtomicUsize,
        high_water: AtomicUsize,
    }

    impl ConcurrencyGauge {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }

        pub fn high_water(&self) -> usize {
            self.high_water.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    pub struct MockSolver {
        pub fail_ids: HashSet<String>,
        pub delays_ms: HashMap<String, u64>,
        pub calls: AtomicUsize,
        pub gauge: Arc<ConcurrencyGauge>,
        pub solved: Arc<Mutex<HashSet<String>>>,
    }

    impl MockSolver {
        pub fn passing() -> Self {
            Self::default()
        }

        pub fn failing_for(ids: &[&str]) -> Self {
            Self {
                fail_ids: ids.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Solver for MockSolver {
        async fn solve(&self, case: &Case) -> Result<String, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gauge.enter();
            if let Some(ms) = self.delays_ms.get(&case.id) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            } else {
                tokio::task::yield_now().await;
            }
            self.gauge.exit();

            if self.fail_ids.contains(&case.id) {
                return Err(StageError::Other(format!("solver unavailable for {}", case.id)));
            }
            self.solved.lock().insert(case.id.clone());
            Ok(format!("answer for {}", case.id))
        }
    }

    pub enum MockJudgeResponse {
        Payload(String),
        Fail(String),
    }

    pub struct MockJudge {
        pub responses: HashMap<String, MockJudgeResponse>,
        pub delays_ms: HashMap<String, u64>,
        pub calls: AtomicUsize,
        pub judged: Mutex<Vec<String>>,
        pub gauge: Arc<ConcurrencyGauge>,
        /// When set, the judge panics if the case was not solved first.
        pub solved: Option<Arc<Mutex<HashSet<String>>>>,
    }

    impl MockJudge {
        pub fn passing() -> Self {
            Self {
                responses: HashMap::new(),
                delays_ms: HashMap::new(),
                calls: AtomicUsize::new(0),
                judged: Mutex::new(Vec::new()),
                gauge: Arc::new(ConcurrencyGauge::default()),
                solved: None,
            }
        }

        pub fn with_response(mut self, id: &str, response: MockJudgeResponse) -> Self {
            self.responses.insert(id.to_string(), response);
            self
        }
    }

    #[async_trait]
    impl Judge for MockJudge {
        async fn judge(&self, case: &Case, answer: &str) -> Result<String, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(solved) = &self.solved {
                assert!(solved.lock().contains(&case.id), "judged before solved");
            }
            assert_eq!(answer, format!("answer for {}", case.id));
            self.judged.lock().push(case.id.clone());

            self.gauge.enter();
            if let Some(ms) = self.delays_ms.get(&case.id) {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            } else {
                tokio::task::yield_now().await;
            }
            self.gauge.exit();

            match self.responses.get(&case.id) {
                Some(MockJudgeResponse::Payload(p)) => Ok(p.clone()),
                Some(MockJudgeResponse::Fail(msg)) => Err(StageError::Other(msg.clone())),
                None => Ok(PASS_PAYLOAD.to_string()),
            }
        }
    }
}
