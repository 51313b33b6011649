//! Scenario runner.
//!
//! Every attempt of every scenario gets its own page from a [`PageLauncher`]
//! and closes it afterwards, so scenarios never share browser state. A
//! semaphore bounds how many pages are open at once.

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::SuiteConfig;
use crate::driver::{DriverError, Page};
use crate::errors::{Result, SuiteError};
use crate::scenarios::ScenarioId;
use crate::types::OutputFormat;

/// Opens a fresh, isolated page for one scenario attempt
#[async_trait]
pub trait PageLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Page>, DriverError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
}

/// Final result of one scenario after all its attempts
#[derive(Clone, Debug, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: ScenarioId,
    pub suite: &'static str,
    pub title: &'static str,
    pub status: Status,
    pub attempts: u32,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub exit_code: i32,
    /// One per failed attempt that could be captured
    pub screenshots: Vec<PathBuf>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.status == Status::Passed
    }

    /// Failure that never reached a scenario error, such as a panic
    fn failed(scenario: ScenarioId, duration_ms: u64, error: String) -> Self {
        ScenarioOutcome {
            scenario,
            suite: scenario.suite(),
            title: scenario.title(),
            status: Status::Failed,
            attempts: 1,
            duration_ms,
            error: Some(error),
            exit_code: 1,
            screenshots: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub environment: String,
    pub base_url: String,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl RunReport {
    fn new(config: &SuiteConfig, outcomes: Vec<ScenarioOutcome>, duration_ms: u64) -> Self {
        let passed = outcomes.iter().filter(|o| o.passed()).count();
        RunReport {
            environment: config.environment.name.to_string(),
            base_url: config.environment.base_url.clone(),
            passed,
            failed: outcomes.len() - passed,
            duration_ms,
            outcomes,
        }
    }

    /// 0 when everything passed, otherwise the exit code of the first failure
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .find(|o| !o.passed())
            .map_or(0, |o| o.exit_code)
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| SuiteError::Other(anyhow::Error::new(e))),
            OutputFormat::Simple => {
                let mut out = String::new();
                for outcome in &self.outcomes {
                    let mark = if outcome.passed() { "✓" } else { "✘" };
                    out.push_str(&format!(
                        "  {} [{}] › {} ({}ms",
                        mark, outcome.suite, outcome.title, outcome.duration_ms
                    ));
                    if outcome.attempts > 1 {
                        out.push_str(&format!(", {} attempts", outcome.attempts));
                    }
                    out.push_str(")\n");
                    if let Some(error) = &outcome.error {
                        out.push_str(&format!("      {}\n", error));
                    }
                    for shot in &outcome.screenshots {
                        out.push_str(&format!("      screenshot: {}\n", shot.display()));
                    }
                }
                out.push_str(&format!(
                    "\n  {} passed, {} failed ({}ms) against {} [{}]\n",
                    self.passed, self.failed, self.duration_ms, self.base_url, self.environment
                ));
                Ok(out)
            }
        }
    }

    /// Write the JSON report next to the failure screenshots
    pub async fn write_json(&self, dir: &std::path::Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SuiteError::Other(e.into()))?;
        let path = dir.join("report.json");
        let body = self.render(OutputFormat::Json)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| SuiteError::Other(e.into()))?;
        Ok(path)
    }
}

pub struct Runner {
    config: Arc<SuiteConfig>,
    launcher: Arc<dyn PageLauncher>,
}

impl Runner {
    pub fn new(config: Arc<SuiteConfig>, launcher: Arc<dyn PageLauncher>) -> Self {
        Runner { config, launcher }
    }

    /// Run `scenarios` with at most `workers` at a time. Outcomes come back
    /// in catalog order regardless of completion order.
    pub async fn run(&self, scenarios: &[ScenarioId]) -> RunReport {
        let started = Instant::now();
        let workers = self.config.run.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        info!(
            "Running {} scenario(s) on {} worker(s) against {}",
            scenarios.len(),
            workers,
            self.config.environment.base_url
        );

        let mut tasks = JoinSet::new();
        for &scenario in scenarios {
            let semaphore = semaphore.clone();
            let config = self.config.clone();
            let launcher = self.launcher.clone();
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let started = Instant::now();
                // A panicking scenario must still produce a failed outcome
                let run = tokio::spawn(async move {
                    run_scenario(scenario, &config, launcher.as_ref()).await
                });
                match run.await {
                    Ok(outcome) => outcome,
                    Err(e) => crashed(scenario, e, started.elapsed().as_millis() as u64),
                }
            });
        }

        let mut outcomes = Vec::with_capacity(scenarios.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Scenario task aborted: {}", e),
            }
        }
        for &scenario in scenarios {
            if !outcomes.iter().any(|o| o.scenario == scenario) {
                outcomes.push(ScenarioOutcome::failed(
                    scenario,
                    0,
                    "scenario task did not finish".to_string(),
                ));
            }
        }
        outcomes.sort_by_key(|o| catalog_position(o.scenario));

        RunReport::new(
            &self.config,
            outcomes,
            started.elapsed().as_millis() as u64,
        )
    }
}

fn crashed(scenario: ScenarioId, err: JoinError, duration_ms: u64) -> ScenarioOutcome {
    let message = if err.is_panic() {
        let payload = err.into_panic();
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        format!("scenario panicked: {}", detail)
    } else {
        format!("scenario task failed: {}", err)
    };
    error!("✘ {}: {}", scenario, message);
    ScenarioOutcome::failed(scenario, duration_ms, message)
}

fn catalog_position(scenario: ScenarioId) -> usize {
    ScenarioId::ALL
        .iter()
        .position(|s| *s == scenario)
        .unwrap_or(usize::MAX)
}

async fn run_scenario(
    scenario: ScenarioId,
    config: &SuiteConfig,
    launcher: &dyn PageLauncher,
) -> ScenarioOutcome {
    let started = Instant::now();
    let max_attempts = config.run.retries.saturating_add(1);
    let mut screenshots = Vec::new();
    let mut last_error = None;
    let mut attempts = 0;

    for attempt in 1..=max_attempts {
        attempts = attempt;
        match run_attempt(scenario, attempt, config, launcher).await {
            Ok(()) => {
                last_error = None;
                break;
            }
            Err((e, shot)) => {
                warn!("{} failed (attempt {}/{}): {}", scenario, attempt, max_attempts, e);
                screenshots.extend(shot);
                last_error = Some(e);
            }
        }
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    match last_error {
        None => {
            info!("✓ {} ({}ms)", scenario, duration_ms);
            ScenarioOutcome {
                scenario,
                suite: scenario.suite(),
                title: scenario.title(),
                status: Status::Passed,
                attempts,
                duration_ms,
                error: None,
                exit_code: 0,
                screenshots,
            }
        }
        Some(e) => {
            error!("✘ {}: {}", scenario, e);
            ScenarioOutcome {
                scenario,
                suite: scenario.suite(),
                title: scenario.title(),
                status: Status::Failed,
                attempts,
                duration_ms,
                error: Some(e.to_string()),
                exit_code: e.exit_code(),
                screenshots,
            }
        }
    }
}

/// One attempt on a fresh page. On failure, returns the error together with
/// the screenshot path if one could be taken.
async fn run_attempt(
    scenario: ScenarioId,
    attempt: u32,
    config: &SuiteConfig,
    launcher: &dyn PageLauncher,
) -> std::result::Result<(), (SuiteError, Option<PathBuf>)> {
    let page = launcher
        .launch()
        .await
        .map_err(|e| (SuiteError::from(e), None))?;

    let limit = config.run.scenario_timeout;
    let result = match tokio::time::timeout(limit, scenario.run(page.as_ref(), config)).await {
        Ok(result) => result,
        Err(_) => Err(SuiteError::ScenarioTimeout {
            scenario: scenario.to_string(),
            limit,
        }),
    };

    let outcome = match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let shot = capture_failure(page.as_ref(), scenario, attempt, config).await;
            Err((e, shot))
        }
    };

    if let Err(e) = page.close().await {
        debug!("Closing page after {} failed: {}", scenario, e);
    }
    outcome
}

async fn capture_failure(
    page: &dyn Page,
    scenario: ScenarioId,
    attempt: u32,
    config: &SuiteConfig,
) -> Option<PathBuf> {
    let png = match page.screenshot().await {
        Ok(png) => png,
        Err(e) => {
            debug!("No failure screenshot for {}: {}", scenario, e);
            return None;
        }
    };

    let dir = &config.run.output_dir;
    let path = dir.join(format!("{}-attempt{}.png", screenshot_stem(scenario), attempt));
    let written = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, png).await
    }
    .await;

    match written {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Could not write {}: {}", path.display(), e);
            None
        }
    }
}

fn screenshot_stem(scenario: ScenarioId) -> String {
    serde_json::to_value(scenario)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", scenario))
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod runner_test;
