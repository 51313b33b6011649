use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, info};

use crate::driver::{DriverError, FrameHandle, Page, Scope};
use crate::runner::PageLauncher;
use crate::types::{Lookup, Query, ViewportSize};
use crate::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

/// WebDriver key code for Enter
const ENTER_KEY: &str = "\u{E007}";

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserType {
    pub fn driver_name(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

/// A browser session driven over WebDriver.
///
/// WebDriver has a single current browsing context per session, so every
/// frame-scoped call enters the frame, runs, and returns to the top-level
/// document before yielding.
pub struct WebDriverPage {
    client: Client,
    browser_type: BrowserType,
    // Removed with the page; keeps the Chrome profile directory alive
    _profile_dir: Option<tempfile::TempDir>,
}

impl WebDriverPage {
    /// Start a new browser session
    ///
    /// # Arguments
    /// * `browser_type` - Firefox or Chrome
    /// * `viewport` - Window dimensions
    /// * `headless` - Whether to run in headless mode
    pub async fn connect(
        browser_type: BrowserType,
        viewport: &ViewportSize,
        headless: bool,
    ) -> Result<Self, DriverError> {
        info!("Connecting to {:?} WebDriver", browser_type);

        // Ensure WebDriver is running (will auto-start if needed)
        let webdriver_url = GLOBAL_WEBDRIVER_MANAGER
            .ensure_driver(&browser_type)
            .await
            .map_err(|e| DriverError::Unavailable(format!("{:#}", e)))?;

        let mut caps = serde_json::Map::new();
        let mut profile_dir = None;

        match browser_type {
            BrowserType::Firefox => {
                let mut args = Vec::new();
                if headless {
                    args.push("--headless".to_string());
                }
                args.push(format!("--width={}", viewport.width));
                args.push(format!("--height={}", viewport.height));

                caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
            }
            BrowserType::Chrome => {
                let mut args = vec!["--no-sandbox".to_string()];
                if headless {
                    args.push("--headless=new".to_string());
                    args.push("--disable-gpu".to_string());
                    args.push("--disable-dev-shm-usage".to_string());
                }
                args.push(format!(
                    "--window-size={},{}",
                    viewport.width, viewport.height
                ));

                // Chrome refuses to share a profile directory between sessions
                let dir = tempfile::Builder::new()
                    .prefix("dashprobe-chrome-")
                    .tempdir()
                    .map_err(|e| DriverError::Unavailable(e.to_string()))?;
                args.push(format!("--user-data-dir={}", dir.path().display()));
                profile_dir = Some(dir);

                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
            }
        }

        debug!("Connecting to WebDriver at {}", webdriver_url);
        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&webdriver_url)
            .await?;

        if let Err(e) = client.set_window_size(viewport.width, viewport.height).await {
            debug!("Note: Could not set window size: {}", e);
        }

        Ok(WebDriverPage {
            client,
            browser_type,
            _profile_dir: profile_dir,
        })
    }

    pub fn browser_type(&self) -> BrowserType {
        self.browser_type
    }

    async fn enter(&self, scope: &Scope) -> Result<(), DriverError> {
        self.client.enter_frame(None).await?;
        if let Scope::Frame(frame) = scope {
            self.client
                .enter_frame(Some(frame.index))
                .await
                .map_err(|_| DriverError::FrameDetached(frame.index))?;
        }
        Ok(())
    }

    async fn leave(&self, scope: &Scope) {
        if scope.is_frame()
            && let Err(e) = self.client.enter_frame(None).await
        {
            debug!("Could not return to top-level document: {}", e);
        }
    }

    async fn find_all(&self, query: &Query) -> Result<Vec<Element>, DriverError> {
        let elements = match query.lookup() {
            Lookup::Css(css) => self.client.find_all(Locator::Css(&css)).await?,
            Lookup::XPath(xpath) => self.client.find_all(Locator::XPath(&xpath)).await?,
        };
        Ok(elements)
    }

    async fn first(&self, query: &Query) -> Result<Element, DriverError> {
        self.find_all(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(query.to_string()))
    }

    async fn frame_url(&self, index: u16) -> Result<String, DriverError> {
        self.client.enter_frame(Some(index)).await?;
        let href = self
            .client
            .execute("return window.location.href;", vec![])
            .await;
        self.client.enter_frame(None).await?;

        match href? {
            serde_json::Value::String(url) => Ok(url),
            other => Err(DriverError::Unavailable(format!(
                "frame {} reported a non-string location: {}",
                index, other
            ))),
        }
    }
}

#[async_trait]
impl Page for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        info!("Navigating to {}", url);
        self.client.enter_frame(None).await?;
        self.client.goto(url).await?;

        // Wait for the document to finish loading (max 2 seconds)
        let wait_script = "return document.readyState === 'complete';";
        for _ in 0..20 {
            match self.client.execute(wait_script, vec![]).await {
                Ok(val) if val.as_bool().unwrap_or(false) => break,
                _ => tokio::time::sleep(tokio::time::Duration::from_millis(100)).await,
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn frames(&self) -> Result<Vec<FrameHandle>, DriverError> {
        self.client.enter_frame(None).await?;
        let iframes = self.client.find_all(Locator::Css("iframe")).await?;

        let mut frames = Vec::with_capacity(iframes.len());
        for (index, iframe) in iframes.iter().enumerate() {
            let index = index as u16;
            // The live document URL reflects in-frame navigation; src is the fallback
            let url = match self.frame_url(index).await {
                Ok(url) => url,
                Err(e) => {
                    debug!("Frame {} location unavailable ({}), using src", index, e);
                    self.client.enter_frame(None).await?;
                    iframe.prop("src").await?.unwrap_or_default()
                }
            };
            frames.push(FrameHandle { index, url });
        }
        Ok(frames)
    }

    async fn count(&self, scope: &Scope, query: &Query) -> Result<usize, DriverError> {
        self.enter(scope).await?;
        let result = self.find_all(query).await.map(|found| found.len());
        self.leave(scope).await;
        result
    }

    async fn is_visible(&self, scope: &Scope, query: &Query) -> Result<bool, DriverError> {
        self.enter(scope).await?;
        let result = async {
            match self.find_all(query).await?.first() {
                Some(element) => Ok(element.is_displayed().await?),
                None => Ok(false),
            }
        }
        .await;
        self.leave(scope).await;
        result
    }

    async fn texts(&self, scope: &Scope, query: &Query) -> Result<Vec<String>, DriverError> {
        self.enter(scope).await?;
        let result = async {
            let mut texts = Vec::new();
            for element in self.find_all(query).await? {
                texts.push(element.text().await?);
            }
            Ok(texts)
        }
        .await;
        self.leave(scope).await;
        result
    }

    async fn click(&self, scope: &Scope, query: &Query) -> Result<(), DriverError> {
        debug!("Clicking {}", query);
        self.enter(scope).await?;
        let result = async {
            self.first(query).await?.click().await?;
            Ok(())
        }
        .await;
        self.leave(scope).await;
        result
    }

    async fn fill(&self, scope: &Scope, query: &Query, value: &str) -> Result<(), DriverError> {
        debug!("Filling {}", query);
        self.enter(scope).await?;
        let result = async {
            let element = self.first(query).await?;
            element.clear().await?;
            element.send_keys(value).await?;
            Ok(())
        }
        .await;
        self.leave(scope).await;
        result
    }

    async fn press_enter(&self, scope: &Scope, query: &Query) -> Result<(), DriverError> {
        self.enter(scope).await?;
        let result = async {
            self.first(query).await?.send_keys(ENTER_KEY).await?;
            Ok(())
        }
        .await;
        self.leave(scope).await;
        result
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.client.enter_frame(None).await?;
        Ok(self.client.screenshot().await?)
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.client.clone().close().await?;
        Ok(())
    }
}

/// Launches one WebDriver session per scenario attempt
#[derive(Clone, Debug)]
pub struct WebDriverLauncher {
    pub browser_type: BrowserType,
    pub viewport: ViewportSize,
    pub headless: bool,
}

impl WebDriverLauncher {
    pub fn from_config(config: &crate::config::SuiteConfig) -> Self {
        WebDriverLauncher {
            browser_type: config.run.browser,
            viewport: config.run.viewport.clone(),
            headless: config.run.headless,
        }
    }
}

#[async_trait]
impl PageLauncher for WebDriverLauncher {
    async fn launch(&self) -> Result<Box<dyn Page>, DriverError> {
        let page = WebDriverPage::connect(self.browser_type, &self.viewport, self.headless).await?;
        Ok(Box::new(page))
    }
}
