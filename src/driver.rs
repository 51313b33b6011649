//! Browser-automation driver boundary.
//!
//! Page objects, the frame resolver and the scenarios only ever talk to a
//! [`Page`]. Any driver that can navigate, enumerate frames and run element
//! queries in a [`Scope`] can stand in for the WebDriver implementation.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Query;

/// An embedded rendering context inside a page.
///
/// Identified by its position among the page's top-level frames in
/// attachment order. Handles go stale on navigation; resolve them again
/// instead of keeping them around.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHandle {
    pub index: u16,
    pub url: String,
}

/// Where a query is evaluated
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The top-level document
    Page,
    /// A child frame
    Frame(FrameHandle),
}

impl Scope {
    pub fn is_frame(&self) -> bool {
        matches!(self, Scope::Frame(_))
    }
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not start a browser session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),
    #[error(transparent)]
    Command(#[from] fantoccini::error::CmdError),
    #[error("no element matches {0}")]
    NoSuchElement(String),
    #[error("frame {0} is no longer attached")]
    FrameDetached(u16),
    #[error("WebDriver is not available: {0}")]
    Unavailable(String),
}

/// One browser tab under automation, owned by a single running scenario
#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&self) -> Result<String, DriverError>;

    /// Frames currently attached to the top-level document, in attachment order
    async fn frames(&self) -> Result<Vec<FrameHandle>, DriverError>;

    /// Number of elements matching `query`
    async fn count(&self, scope: &Scope, query: &Query) -> Result<usize, DriverError>;

    /// Whether the first element matching `query` is displayed; false when
    /// nothing matches
    async fn is_visible(&self, scope: &Scope, query: &Query) -> Result<bool, DriverError>;

    /// Text of every element matching `query`, in document order
    async fn texts(&self, scope: &Scope, query: &Query) -> Result<Vec<String>, DriverError>;

    /// Click the first element matching `query`
    async fn click(&self, scope: &Scope, query: &Query) -> Result<(), DriverError>;

    /// Replace the value of the first input matching `query`
    async fn fill(&self, scope: &Scope, query: &Query, value: &str) -> Result<(), DriverError>;

    async fn press_enter(&self, scope: &Scope, query: &Query) -> Result<(), DriverError>;

    /// PNG screenshot of the viewport
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// End the browser session
    async fn close(&self) -> Result<(), DriverError>;
}
