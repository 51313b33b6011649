//! Frame Resolver: finds the frame hosting the embedded reporting widget.
//!
//! The embed may be missing (first paint, slow third-party script), late, or
//! rendered straight into the page depending on the dashboard. Resolution
//! therefore never fails: it reports what it found and lets callers fall back
//! to the top-level page. Only [`FrameResolver::wait_for_chart_visible`] can
//! fail, and only after both the frame and the page came up empty.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::SuiteConfig;
use crate::driver::{FrameHandle, Page, Scope};
use crate::errors::Result;
use crate::expect::Expect;
use crate::types::{Query, Timeouts};

/// Upper bound on rows read by a table snapshot
pub const SNAPSHOT_ROWS: usize = 3;

/// Predicate over frame URLs deciding which frame hosts the content
#[derive(Clone)]
pub struct FrameMatcher {
    description: String,
    predicate: Arc<dyn Fn(&str) -> bool + Send + Sync>,
}

impl FrameMatcher {
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        FrameMatcher {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Match frames whose URL contains `marker`
    pub fn url_contains(marker: &str) -> Self {
        let owned = marker.to_string();
        Self::new(format!("url contains '{}'", marker), move |url| {
            url.contains(&owned)
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        (self.predicate)(url)
    }
}

impl fmt::Debug for FrameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FrameMatcher").field(&self.description).finish()
    }
}

/// Outcome of one content-frame lookup
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// First matching frame in attachment order
    Found(FrameHandle),
    /// No frame matched; zero `frames_seen` means no embed at all
    NotFound { frames_seen: usize },
    /// Frames could not be enumerated
    Degraded { reason: String },
}

impl Resolution {
    /// Where content queries should run: the frame, or the top-level page
    pub fn scope(&self) -> Scope {
        match self {
            Resolution::Found(frame) => Scope::Frame(frame.clone()),
            _ => Scope::Page,
        }
    }

    pub fn frame(&self) -> Option<&FrameHandle> {
        match self {
            Resolution::Found(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Where a chart title was finally seen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartLocation {
    /// Inside the content frame
    Frame,
    /// On the top-level page after the content frame never showed it
    PageAfterFrameMiss,
    /// On the top-level page; no content frame existed
    Page,
}

pub struct FrameResolver<'a> {
    matcher: &'a FrameMatcher,
    timeouts: &'a Timeouts,
    table_query: &'a Query,
}

impl<'a> FrameResolver<'a> {
    pub fn new(matcher: &'a FrameMatcher, timeouts: &'a Timeouts, table_query: &'a Query) -> Self {
        FrameResolver {
            matcher,
            timeouts,
            table_query,
        }
    }

    pub fn from_config(config: &'a SuiteConfig) -> Self {
        Self::new(
            &config.frame_matcher,
            &config.timeouts,
            &config.selectors.table_first_column,
        )
    }

    /// Find the content frame among the frames attached right now
    pub async fn resolve_content_frame(&self, page: &dyn Page) -> Resolution {
        let frames = match page.frames().await {
            Ok(frames) => frames,
            Err(e) => {
                warn!("Could not enumerate frames, using page context: {}", e);
                return Resolution::Degraded {
                    reason: e.to_string(),
                };
            }
        };

        if frames.is_empty() {
            debug!("No frames attached, using page context");
            return Resolution::NotFound { frames_seen: 0 };
        }

        let frames_seen = frames.len();
        match frames
            .into_iter()
            .find(|frame| self.matcher.matches(&frame.url))
        {
            Some(frame) => {
                debug!("Content frame {} at {}", frame.index, frame.url);
                Resolution::Found(frame)
            }
            None => {
                debug!(
                    "None of {} frames matched {:?}, using page context",
                    frames_seen, self.matcher
                );
                Resolution::NotFound { frames_seen }
            }
        }
    }

    /// Wait for a chart titled `title`, in the content frame if there is one,
    /// otherwise (or if the frame never shows it) on the page itself
    pub async fn wait_for_chart_visible(
        &self,
        page: &dyn Page,
        title: &str,
    ) -> Result<ChartLocation> {
        let expect = Expect::new(page, self.timeouts.poll_interval);
        let query = Query::text(title);
        let limit = self.timeouts.long;

        if let Resolution::Found(frame) = self.resolve_content_frame(page).await {
            let scope = Scope::Frame(frame);
            if expect.wait_visible(&scope, &query, limit).await {
                info!("Chart '{}' visible in content frame", title);
                return Ok(ChartLocation::Frame);
            }

            warn!(
                "Chart '{}' not visible in content frame, checking page context",
                title
            );
            expect.visible(&Scope::Page, &query, limit).await?;
            return Ok(ChartLocation::PageAfterFrameMiss);
        }

        expect.visible(&Scope::Page, &query, limit).await?;
        info!("Chart '{}' visible in page context", title);
        Ok(ChartLocation::Page)
    }

    /// Best-effort read of the first column of up to three table rows inside
    /// the content frame. Empty when there is no frame or no table.
    pub async fn read_table_snapshot(&self, page: &dyn Page) -> Vec<String> {
        let Resolution::Found(frame) = self.resolve_content_frame(page).await else {
            return Vec::new();
        };

        match page.texts(&Scope::Frame(frame), self.table_query).await {
            Ok(cells) => cells.into_iter().take(SNAPSHOT_ROWS).collect(),
            Err(e) => {
                warn!("Couldn't read table data, continuing: {}", e);
                Vec::new()
            }
        }
    }

    /// URL of the content frame, if one is attached
    pub async fn content_frame_url(&self, page: &dyn Page) -> Option<String> {
        self.resolve_content_frame(page)
            .await
            .frame()
            .map(|frame| frame.url.clone())
    }

    /// Log every attached frame; diagnostics only
    pub async fn log_frame_details(&self, page: &dyn Page) {
        match page.frames().await {
            Ok(frames) => {
                info!("Number of frames found: {}", frames.len());
                for frame in &frames {
                    info!(
                        "Frame {} URL: {}{}",
                        frame.index,
                        frame.url,
                        if self.matcher.matches(&frame.url) {
                            " (content)"
                        } else {
                            ""
                        }
                    );
                }
            }
            Err(e) => warn!("Could not enumerate frames: {}", e),
        }
    }
}
