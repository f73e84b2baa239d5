use std::path::PathBuf;

use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

const DEFAULT_CASES_FILE: &str = "data/test_cases.jsonl";
const DEFAULT_RESULTS_CSV: &str = "results.csv";
const DEFAULT_LOG_FILE: &str = "run.log";
pub const DEFAULT_MAX_CONCURRENT: usize = 12;
const DEFAULT_SOLVER_MODEL: &str = "gpt-5.1";
const DEFAULT_JUDGE_MODEL: &str = "gpt-5.1";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_SOLVER_MAX_TOKENS: u32 = 800;
const DEFAULT_JUDGE_MAX_TOKENS: u32 = 400;
const DEFAULT_REQUEST_TIMEOUT: u64 = 120;

#[derive(Debug, Clone)]
pub struct Config {
    pub cases_file: PathBuf,
    pub results_csv: PathBuf,
    pub log_file: PathBuf,
    pub max_concurrent_cases: usize,
    pub solver_model: String,
    pub judge_model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    pub solver_max_tokens: u32,
    pub judge_max_tokens: u32,
    pub request_timeout_secs: u64,
    pub enforce_style_consistency: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            cases_file: env_path("CASES_FILE", DEFAULT_CASES_FILE),
            results_csv: env_path("RESULTS_CSV", DEFAULT_RESULTS_CSV),
            log_file: env_path("LOG_FILE", DEFAULT_LOG_FILE),
            max_concurrent_cases: env_parse("MAX_CONCURRENT_CASES", DEFAULT_MAX_CONCURRENT),
            solver_model: std::env::var("SOLVER_MODEL")
                .unwrap_or_else(|_| DEFAULT_SOLVER_MODEL.into()),
            judge_model: std::env::var("JUDGE_MODEL").unwrap_or_else(|_| DEFAULT_JUDGE_MODEL.into()),
            api_base: std::env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            api_key: std::env::var(API_KEY_VAR).ok().filter(|k| !k.trim().is_empty()),
            solver_max_tokens: env_parse("SOLVER_MAX_TOKENS", DEFAULT_SOLVER_MAX_TOKENS),
            judge_max_tokens: env_parse("JUDGE_MAX_TOKENS", DEFAULT_JUDGE_MAX_TOKENS),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT),
            enforce_style_consistency: env_parse("ENFORCE_STYLE_CONSISTENCY", false),
        }
    }

    /// The credential every stage adapter needs. Checked once, before the
    /// batch starts.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))
    }

    pub fn print_banner(&self) {
        tracing::info!("╔══════════════════════════════════════════════════╗");
        tracing::info!("║           judge-runner v{}                    ║", env!("CARGO_PKG_VERSION"));
        tracing::info!("╠══════════════════════════════════════════════════╣");
        tracing::info!("║  Cases file:        {:<28}║", self.cases_file.display());
        tracing::info!("║  Results CSV:       {:<28}║", self.results_csv.display());
        tracing::info!("║  Log file:          {:<28}║", self.log_file.display());
        tracing::info!("║  Max concurrent:    {:<28}║", self.max_concurrent_cases);
        tracing::info!("║  Solver model:      {:<28}║", self.solver_model);
        tracing::info!("║  Judge model:       {:<28}║", self.judge_model);
        tracing::info!("║  API base:          {:<28}║", self.api_base);
        tracing::info!("║  API key:           {:<28}║", if self.api_key.is_some() { "present" } else { "missing" });
        tracing::info!("║  Request timeout:   {:<25}s ║", self.request_timeout_secs);
        tracing::info!("║  Style checks:      {:<28}║", if self.enforce_style_consistency { "enforced" } else { "trusted" });
        tracing::info!("╚══════════════════════════════════════════════════╝");
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    PathBuf::from(std::env::var(key).unwrap_or_else(|_| default.into()))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
