//! Tiered fallback navigation.
//!
//! A navigation is an ordered list of strategies, each more explicit than the
//! last: a primary locator, an alternate locator, then a direct URL. A tier
//! only runs after the previous one timed out or failed, so the worst case
//! costs the sum of all tier timeouts.

use std::time::Duration;
use tracing::{info, warn};

use crate::driver::{Page, Scope};
use crate::errors::{Result, SuiteError};
use crate::expect::Expect;
use crate::types::Query;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tier {
    /// Wait for `query` to become visible, then click it
    Click {
        label: String,
        query: Query,
        timeout: Duration,
    },
    /// Navigate straight to `url`
    Goto { label: String, url: String },
}

impl Tier {
    pub fn label(&self) -> &str {
        match self {
            Tier::Click { label, .. } | Tier::Goto { label, .. } => label,
        }
    }

    fn budget(&self) -> Duration {
        match self {
            Tier::Click { timeout, .. } => *timeout,
            Tier::Goto { .. } => Duration::ZERO,
        }
    }
}

/// Which tier got us there
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub tier: usize,
    pub label: String,
}

#[derive(Clone, Debug, Default)]
pub struct TieredNavigation {
    tiers: Vec<Tier>,
}

impl TieredNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn click(mut self, label: &str, query: Query, timeout: Duration) -> Self {
        self.tiers.push(Tier::Click {
            label: label.to_string(),
            query,
            timeout,
        });
        self
    }

    pub fn goto(mut self, label: &str, url: String) -> Self {
        self.tiers.push(Tier::Goto {
            label: label.to_string(),
            url,
        });
        self
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Try each tier in order until one succeeds. When all fail, the last
    /// tier's failure is reported as an assertion failure.
    pub async fn run(&self, page: &dyn Page, poll_interval: Duration) -> Result<NavigationOutcome> {
        let expect = Expect::new(page, poll_interval);
        let total: Duration = self.tiers.iter().map(Tier::budget).sum();
        let mut last_failure = String::from("no navigation strategy configured");

        for (index, tier) in self.tiers.iter().enumerate() {
            let attempt = match tier {
                Tier::Click { query, timeout, .. } => {
                    match expect.visible(&Scope::Page, query, *timeout).await {
                        Ok(()) => page.click(&Scope::Page, query).await.map_err(SuiteError::from),
                        Err(e) => Err(e),
                    }
                }
                Tier::Goto { url, .. } => {
                    info!("Navigating directly to {}", url);
                    page.goto(url).await.map_err(SuiteError::from)
                }
            };

            match attempt {
                Ok(()) => {
                    if index > 0 {
                        info!("Navigation succeeded via fallback '{}'", tier.label());
                    }
                    return Ok(NavigationOutcome {
                        tier: index,
                        label: tier.label().to_string(),
                    });
                }
                Err(e) => {
                    warn!("Navigation tier '{}' failed: {}", tier.label(), e);
                    last_failure = format!("'{}' failed: {}", tier.label(), e);
                }
            }
        }

        Err(SuiteError::assertion(
            format!(
                "navigation to succeed after {} tier(s); last {}",
                self.tiers.len(),
                last_failure
            ),
            total,
        ))
    }
}
