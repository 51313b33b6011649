use std::time::Duration;

use thiserror::Error;

use crate::driver::DriverError;

/// Failure of a suite operation, carrying the process exit code for its class
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Configuration could not be resolved (exit code 2)
    #[error("Configuration error: {0}")]
    Config(String),
    /// An expected UI state did not materialize within its timeout (exit code 3)
    #[error("Assertion failed: {what} (waited {}ms)", .timeout.as_millis())]
    Assertion { what: String, timeout: Duration },
    /// WebDriver session or command failure (exit code 4)
    #[error("WebDriver failed: {0}")]
    Driver(#[from] DriverError),
    /// A whole scenario exceeded its time budget (exit code 5)
    #[error("Scenario '{scenario}' timed out after {}s", .limit.as_secs())]
    ScenarioTimeout { scenario: String, limit: Duration },
    /// Generic error (exit code 1)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SuiteError {
    pub fn config(msg: impl Into<String>) -> Self {
        SuiteError::Config(msg.into())
    }

    pub fn assertion(what: impl Into<String>, timeout: Duration) -> Self {
        SuiteError::Assertion {
            what: what.into(),
            timeout,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SuiteError::Config(_) => 2,
            SuiteError::Assertion { .. } => 3,
            SuiteError::Driver(_) => 4,
            SuiteError::ScenarioTimeout { .. } => 5,
            SuiteError::Other(_) => 1,
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, SuiteError::Assertion { .. })
    }
}

pub type Result<T, E = SuiteError> = std::result::Result<T, E>;
