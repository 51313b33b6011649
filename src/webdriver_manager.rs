use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::webdriver::BrowserType;

/// Attempts made while waiting for a freshly spawned driver (100ms apart)
const STARTUP_ATTEMPTS: u32 = 30;

/// Owns the WebDriver server processes (geckodriver, chromedriver) started
/// on behalf of the suite. Drivers that were already running are reused and
/// left alone.
#[derive(Default)]
pub struct WebDriverManager {
    processes: Mutex<Vec<DriverProcess>>,
}

struct DriverProcess {
    browser_type: BrowserType,
    child: Child,
    port: u16,
    url: String,
}

impl WebDriverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the URL of a ready driver for `browser_type`, starting one if
    /// none answers on the managed or standard ports
    pub async fn ensure_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let managed: Vec<String> = self
            .lock()
            .iter()
            .filter(|p| p.browser_type == *browser_type)
            .map(|p| p.url.clone())
            .collect();

        for url in managed {
            if Self::verify_driver_working(&url).await {
                debug!("Using managed WebDriver at {}", url);
                return Ok(url);
            }
        }

        let standard = Self::standard_url(browser_type);
        if Self::is_driver_running(standard).await && Self::verify_driver_working(standard).await {
            debug!("Found external WebDriver at {}", standard);
            return Ok(standard.to_string());
        }

        info!(
            "No {} answering, starting one",
            browser_type.driver_name()
        );
        self.start_driver(browser_type).await
    }

    fn standard_url(browser_type: &BrowserType) -> &'static str {
        match browser_type {
            BrowserType::Firefox => "http://localhost:4444",
            BrowserType::Chrome => "http://localhost:9515",
        }
    }

    async fn start_driver(&self, browser_type: &BrowserType) -> Result<String> {
        let command = browser_type.driver_name();
        let port = Self::find_free_port_for_browser(browser_type)?;
        let args = match browser_type {
            BrowserType::Firefox => vec!["--port".to_string(), port.to_string()],
            BrowserType::Chrome => vec![format!("--port={}", port)],
        };

        if !Self::command_exists(command) {
            anyhow::bail!(
                "{} not found in PATH. Install it or start a WebDriver server on {}",
                command,
                Self::standard_url(browser_type)
            );
        }

        info!("Starting {} on port {}", command, port);
        let mut cmd = Command::new(command);
        cmd.args(&args).stdout(Stdio::null()).stderr(Stdio::null());

        // Own process group, so stopping the driver also stops its browsers
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start {}", command))?;
        let url = format!("http://localhost:{}", port);

        self.lock().push(DriverProcess {
            browser_type: *browser_type,
            child,
            port,
            url: url.clone(),
        });

        for attempt in 1..=STARTUP_ATTEMPTS {
            if Self::is_driver_running(&url).await {
                info!("WebDriver ready on port {}", port);
                return Ok(url);
            }
            if attempt < STARTUP_ATTEMPTS {
                sleep(Duration::from_millis(100)).await;
            }
        }

        self.stop_port(port);
        anyhow::bail!("{} did not become ready on port {}", command, port)
    }

    /// Check if a command exists in PATH
    pub fn command_exists(command: &str) -> bool {
        let finder = if cfg!(windows) { "where" } else { "which" };
        Command::new(finder)
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Prefer the browser's conventional ports, then let the OS pick
    pub fn find_free_port_for_browser(browser_type: &BrowserType) -> Result<u16> {
        let preferred = match browser_type {
            BrowserType::Firefox => [4444, 4445, 4446],
            BrowserType::Chrome => [9515, 9516, 9517],
        };

        if let Some(port) = preferred.into_iter().find(|p| !Self::is_port_in_use(*p)) {
            debug!("Found free port {} for {:?}", port, browser_type);
            return Ok(port);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        Ok(listener.local_addr()?.port())
    }

    pub fn is_port_in_use(port: u16) -> bool {
        std::net::TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// Whether anything answers the WebDriver status endpoint at `url`
    pub async fn is_driver_running(url: &str) -> bool {
        Self::status(url).await.is_some()
    }

    /// Whether the driver at `url` reports itself ready for a new session
    pub async fn verify_driver_working(url: &str) -> bool {
        Self::status(url)
            .await
            .and_then(|body| body.pointer("/value/ready").and_then(|r| r.as_bool()))
            .unwrap_or(false)
    }

    async fn status(url: &str) -> Option<serde_json::Value> {
        let response = reqwest::Client::new()
            .get(format!("{}/status", url))
            .timeout(Duration::from_secs(1))
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<serde_json::Value>().await.ok()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DriverProcess>> {
        // A panic while holding the lock leaves the list itself intact
        self.processes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stop_port(&self, port: u16) {
        let mut processes = self.lock();
        if let Some(index) = processes.iter().position(|p| p.port == port) {
            let mut process = processes.remove(index);
            Self::terminate(&mut process);
        }
    }

    fn terminate(process: &mut DriverProcess) {
        debug!("Stopping WebDriver on port {}", process.port);
        #[cfg(unix)]
        {
            let pgid = process.child.id();
            if let Err(e) = Command::new("kill")
                .args(["-TERM", &format!("-{}", pgid)])
                .output()
            {
                debug!("Failed to signal process group {}: {}", pgid, e);
            }
        }
        let _ = process.child.kill();
        let _ = process.child.wait();
    }

    /// Number of driver processes started by this manager and still tracked
    pub fn managed_count(&self) -> usize {
        self.lock().len()
    }

    /// Stop all managed WebDriver processes
    pub fn stop_all(&self) {
        let mut processes = self.lock();
        for process in processes.iter_mut() {
            Self::terminate(process);
        }
        processes.clear();
    }
}

impl Drop for WebDriverManager {
    fn drop(&mut self) {
        self.stop_all();
    }
}

lazy_static::lazy_static! {
    pub static ref GLOBAL_WEBDRIVER_MANAGER: WebDriverManager = WebDriverManager::new();
}

#[cfg(test)]
#[path = "webdriver_manager_test.rs"]
mod webdriver_manager_test;
