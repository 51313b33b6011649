use std::path::PathBuf;
use std::time::Duration;

use crate::environment::{
    CredentialSet, DEFAULT_ENVIRONMENT, EnvOverrides, Environment, EnvironmentName,
};
use crate::errors::{Result, SuiteError};
use crate::frames::FrameMatcher;
use crate::selectors::{DashboardRef, Routes, Selectors, default_dashboards};
use crate::types::{Timeouts, ViewportSize};
use crate::webdriver::BrowserType;

/// URL fragment identifying frames that embed the reporting widget
pub const DEFAULT_FRAME_MARKER: &str = "grafana";

/// How the runner schedules scenarios
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub browser: BrowserType,
    pub headless: bool,
    pub viewport: ViewportSize,
    /// Maximum number of scenarios running at once
    pub workers: usize,
    /// Extra attempts for a failing scenario, each with a fresh page
    pub retries: u32,
    pub scenario_timeout: Duration,
    /// Failure screenshots and the JSON report land here
    pub output_dir: PathBuf,
    /// Launch the local application server before running
    pub start_server: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            browser: BrowserType::Chrome,
            headless: true,
            viewport: ViewportSize::default(),
            workers: default_workers(),
            retries: 0,
            scenario_timeout: Duration::from_secs(60),
            output_dir: PathBuf::from("test-report"),
            start_server: false,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| (n.get() / 2).max(1))
        .unwrap_or(1)
}

/// Command-line values that take precedence over the process environment
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub environment: Option<String>,
    pub browser: Option<BrowserType>,
    pub headless: Option<bool>,
    pub workers: Option<usize>,
    pub retries: Option<u32>,
    pub selectors_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub viewport: Option<ViewportSize>,
    pub start_server: bool,
}

/// Everything a scenario needs, built once at process start and shared
/// read-only with every page object
#[derive(Clone, Debug)]
pub struct SuiteConfig {
    pub environment: Environment,
    pub credentials: CredentialSet,
    pub selectors: Selectors,
    pub routes: Routes,
    pub dashboards: Vec<DashboardRef>,
    pub timeouts: Timeouts,
    pub frame_matcher: FrameMatcher,
    pub run: RunSettings,
}

impl SuiteConfig {
    /// Build from the real process environment
    pub fn from_process_env(overrides: &ConfigOverrides) -> Result<Self> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok(), overrides)
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Fails before any browser work when the environment name is unknown or
    /// the selector file cannot be loaded.
    pub fn from_lookup(
        lookup: &dyn Fn(&str) -> Option<String>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let env_name = overrides
            .environment
            .clone()
            .or_else(|| lookup("TEST_ENV").filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let env_overrides = EnvOverrides {
            base_url: lookup("BASE_URL").filter(|v| !v.is_empty()),
            api_base_url: lookup("API_BASE_URL").filter(|v| !v.is_empty()),
        };
        let environment = Environment::resolve(&env_name, &env_overrides)?;

        let selectors = match &overrides.selectors_file {
            Some(path) => Selectors::from_json_file(path)?,
            None => Selectors::default(),
        };

        let ci = flag(lookup, "CI");
        let mut run = RunSettings::default();
        if ci {
            run.workers = 1;
            run.retries = 2;
        }
        if flag(lookup, "DASHPROBE_SINGLE_WORKER") {
            run.workers = 1;
        }
        run.start_server = overrides.start_server || flag(lookup, "DASHPROBE_START_SERVER");
        if run.start_server && environment.name != EnvironmentName::Local {
            return Err(SuiteError::config(format!(
                "The local application can only be started for the local environment, not '{}'",
                environment.name
            )));
        }
        if let Some(browser) = overrides.browser {
            run.browser = browser;
        }
        if let Some(headless) = overrides.headless {
            run.headless = headless;
        }
        if let Some(workers) = overrides.workers {
            run.workers = workers.max(1);
        }
        if let Some(retries) = overrides.retries {
            run.retries = retries;
        }
        if let Some(viewport) = &overrides.viewport {
            run.viewport = viewport.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            run.output_dir = dir.clone();
        }

        Ok(SuiteConfig {
            environment,
            credentials: CredentialSet::from_lookup(lookup),
            selectors,
            routes: Routes::default(),
            dashboards: default_dashboards(),
            timeouts: Timeouts::default(),
            frame_matcher: FrameMatcher::url_contains(DEFAULT_FRAME_MARKER),
            run,
        })
    }

    /// Absolute URL for an application path
    pub fn url(&self, path: &str) -> String {
        self.environment.url(path)
    }

    pub fn dashboard(&self, name: &str) -> Option<&DashboardRef> {
        self.dashboards.iter().find(|d| d.name == name)
    }

    /// Direct URL of a catalogued dashboard
    pub fn dashboard_url(&self, name: &str) -> Option<String> {
        self.dashboard(name)
            .and_then(|d| d.path.as_deref())
            .map(|path| self.url(path))
    }
}

/// A boolean environment flag: set, non-empty and not "0"/"false"
fn flag(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> bool {
    match lookup(key) {
        Some(value) => {
            let value = value.trim().to_lowercase();
            !value.is_empty() && value != "0" && value != "false"
        }
        None => false,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
