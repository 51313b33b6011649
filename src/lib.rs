//! # dashprobe
#![allow(clippy::uninlined_format_args)]
//!
//! Browser-driven end-to-end checks for the analytics dashboard application.
//!
//! Drives a real browser over WebDriver through sign-in, dashboard
//! navigation, chart visibility, date-range filtering and sign-out, across
//! several deployment environments.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Run every scenario against QA
//! dashprobe run
//!
//! # Run selected scenarios against staging in Firefox, visible
//! dashprobe run --env staging --browser firefox --no-headless \
//!     --scenario login-happy-path --scenario dashboard-chart
//!
//! # Run against the bundled local application
//! TEST_ENV=local dashprobe run --start-server
//!
//! # Swap selectors for another application build
//! dashprobe run --selectors selectors.json
//!
//! # Machine-readable report
//! dashprobe run --format json | jq '.outcomes[] | select(.status == "failed")'
//!
//! # Scenario catalog and resolved environment
//! dashprobe list
//! dashprobe env --env production
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `TEST_ENV` | `local`, `qa` (default), `staging` or `production` |
//! | `BASE_URL`, `API_BASE_URL` | override the non-local URLs |
//! | `QA_STANDARD_USER_EMAIL` etc. | per-role credentials |
//! | `CI` | one worker, two retries |
//! | `RUST_LOG` | log filter, default `dashprobe=info` |
//!
//! ## Library Usage
//!
//! Scenarios only talk to the [`driver::Page`] trait, so they can run on any
//! driver:
//!
//! ```no_run
//! use std::sync::Arc;
//! use dashprobe::config::{ConfigOverrides, SuiteConfig};
//! use dashprobe::runner::Runner;
//! use dashprobe::scenarios::ScenarioId;
//! use dashprobe::webdriver::WebDriverLauncher;
//!
//! # async fn example() -> dashprobe::errors::Result<()> {
//! let config = Arc::new(SuiteConfig::from_process_env(&ConfigOverrides::default())?);
//! let launcher = Arc::new(WebDriverLauncher::from_config(&config));
//! let report = Runner::new(config, launcher)
//!     .run(&[ScenarioId::LoginHappyPath])
//!     .await;
//! assert_eq!(report.exit_code(), 0);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod environment;
pub mod errors;
pub mod expect;
pub mod frames;
/// Local stand-in for the dashboard application
#[cfg(feature = "local-server")]
pub mod mock_app;
pub mod navigation;
pub mod pages;
pub mod runner;
pub mod scenarios;
pub mod selectors;
pub mod types;
pub mod webdriver;
pub mod webdriver_manager;

pub use config::SuiteConfig;
pub use driver::{DriverError, FrameHandle, Page, Scope};
pub use errors::{Result, SuiteError};
pub use frames::{ChartLocation, FrameMatcher, FrameResolver, Resolution};
pub use runner::{PageLauncher, RunReport, Runner};
pub use scenarios::ScenarioId;
pub use types::{Query, Timeouts};
pub use webdriver::{BrowserType, WebDriverLauncher, WebDriverPage};
