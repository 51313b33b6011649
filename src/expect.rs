//! Bounded waits and assertions over a [`Page`].
//!
//! Every wait polls the page until its condition holds or the timeout
//! elapses. Driver errors during a probe (stale elements, a frame being
//! recreated) count as "not yet", so only the timeout decides failure.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::driver::{Page, Scope};
use crate::errors::{Result, SuiteError};
use crate::types::Query;

/// Probe until `probe` yields `true` or `timeout` elapses. The probe always
/// runs at least once.
pub async fn poll_until<F, Fut>(timeout: Duration, interval: Duration, mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, crate::driver::DriverError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match probe().await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("Probe failed, retrying: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// Assertions against one page, polling at a fixed interval
#[derive(Clone, Copy)]
pub struct Expect<'a> {
    page: &'a dyn Page,
    poll_interval: Duration,
}

impl<'a> Expect<'a> {
    pub fn new(page: &'a dyn Page, poll_interval: Duration) -> Self {
        Expect {
            page,
            poll_interval,
        }
    }

    /// Wait for `query` to become visible; `false` on timeout
    pub async fn wait_visible(&self, scope: &Scope, query: &Query, timeout: Duration) -> bool {
        let page = self.page;
        poll_until(timeout, self.poll_interval, || page.is_visible(scope, query)).await
    }

    pub async fn visible(&self, scope: &Scope, query: &Query, timeout: Duration) -> Result<()> {
        if self.wait_visible(scope, query, timeout).await {
            Ok(())
        } else {
            Err(SuiteError::assertion(
                format!("{} to be visible{}", query, scope_suffix(scope)),
                timeout,
            ))
        }
    }

    pub async fn text_contains(
        &self,
        scope: &Scope,
        query: &Query,
        expected: &str,
        timeout: Duration,
    ) -> Result<()> {
        let page = self.page;
        let found = poll_until(timeout, self.poll_interval, || async move {
            let texts = page.texts(scope, query).await?;
            Ok(texts.iter().any(|t| t.contains(expected)))
        })
        .await;

        if found {
            Ok(())
        } else {
            let actual = page.texts(scope, query).await.unwrap_or_default();
            Err(SuiteError::assertion(
                format!(
                    "{} to contain text '{}' (found {:?})",
                    query, expected, actual
                ),
                timeout,
            ))
        }
    }

    pub async fn url_contains(&self, fragment: &str, timeout: Duration) -> Result<()> {
        self.url_matches(timeout, &format!("URL to contain '{}'", fragment), |url| {
            url.contains(fragment)
        })
        .await
    }

    pub async fn url_is(&self, expected: &str, timeout: Duration) -> Result<()> {
        self.url_matches(timeout, &format!("URL to be '{}'", expected), |url| {
            url.trim_end_matches('/') == expected.trim_end_matches('/')
        })
        .await
    }

    async fn url_matches(
        &self,
        timeout: Duration,
        what: &str,
        predicate: impl Fn(&str) -> bool,
    ) -> Result<()> {
        let page = self.page;
        let predicate = &predicate;
        let matched = poll_until(timeout, self.poll_interval, || async move {
            Ok(predicate(&page.current_url().await?))
        })
        .await;

        if matched {
            Ok(())
        } else {
            let actual = page
                .current_url()
                .await
                .unwrap_or_else(|_| "<unknown>".to_string());
            Err(SuiteError::assertion(
                format!("{} (last URL: {})", what, actual),
                timeout,
            ))
        }
    }
}

fn scope_suffix(scope: &Scope) -> String {
    match scope {
        Scope::Page => String::new(),
        Scope::Frame(frame) => format!(" in frame {} ({})", frame.index, frame.url),
    }
}

#[cfg(test)]
#[path = "expect_test.rs"]
mod expect_test;
