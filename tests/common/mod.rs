// Common test utilities: an in-memory Page and a model of the dashboard app
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashprobe::config::{ConfigOverrides, SuiteConfig};
use dashprobe::driver::{DriverError, FrameHandle, Page, Scope};
use dashprobe::runner::PageLauncher;
use dashprobe::scenarios::{CHART_TITLE, PRIMARY_DASHBOARD, SECONDARY_DASHBOARD};
use dashprobe::types::{Query, Timeouts};

pub const STANDARD_EMAIL: &str = "standard@example.com";
pub const STANDARD_PASSWORD: &str = "correct-horse";
pub const SECONDARY_PATH: &str = "/next/dashboards/g/2090/pavi-qa-test";

/// Get the browser to use for live tests from TEST_BROWSER.
/// Defaults to "chrome" if not set
pub fn get_test_browser() -> &'static str {
    match std::env::var("TEST_BROWSER") {
        Ok(browser) if browser == "firefox" => "firefox",
        _ => "chrome",
    }
}

/// Suite configuration with fast timeouts and known credentials
pub fn test_config() -> SuiteConfig {
    let mut config = SuiteConfig::from_lookup(
        &|key: &str| match key {
            "QA_STANDARD_USER_EMAIL" => Some(STANDARD_EMAIL.to_string()),
            "QA_STANDARD_USER_PASSWORD" => Some(STANDARD_PASSWORD.to_string()),
            _ => None,
        },
        &ConfigOverrides::default(),
    )
    .expect("default configuration resolves");
    config.timeouts = Timeouts::uniform(Duration::from_millis(200));
    config
}

#[derive(Clone, Debug)]
pub struct FakeElement {
    pub query: Query,
    pub texts: Vec<String>,
    pub visible: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FakeFrame {
    pub url: String,
    pub elements: Vec<FakeElement>,
}

/// What the page shows at one URL
#[derive(Clone, Debug, Default)]
pub struct Screen {
    pub elements: Vec<FakeElement>,
    pub frames: Vec<FakeFrame>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, query: Query) -> Self {
        self.with_text(query, &[""])
    }

    pub fn with_text(mut self, query: Query, texts: &[&str]) -> Self {
        self.elements.push(FakeElement {
            query,
            texts: texts.iter().map(|t| t.to_string()).collect(),
            visible: true,
        });
        self
    }

    pub fn hidden(mut self, query: Query, texts: &[&str]) -> Self {
        self.elements.push(FakeElement {
            query,
            texts: texts.iter().map(|t| t.to_string()).collect(),
            visible: false,
        });
        self
    }

    pub fn with_frame(mut self, url: &str, content: Screen) -> Self {
        self.frames.push(FakeFrame {
            url: url.to_string(),
            elements: content.elements,
        });
        self
    }
}

pub type ClickHandler = Arc<dyn Fn(&mut FakeState) + Send + Sync>;

pub struct FakeState {
    pub url: String,
    pub current: Screen,
    pub screens: HashMap<String, Screen>,
    /// URLs that bounce to `login_url` unless signed in
    pub protected: HashSet<String>,
    pub login_url: String,
    pub signed_in: bool,
    pub handlers: Vec<(Option<String>, Query, ClickHandler)>,
    pub inputs: HashMap<Query, String>,
    pub log: Vec<String>,
    pub fail_frames: bool,
    pub fail_screenshot: bool,
    pub closed: bool,
}

impl FakeState {
    pub fn navigate(&mut self, url: &str) {
        let target = if !self.signed_in && self.protected.contains(url) {
            self.login_url.clone()
        } else {
            url.to_string()
        };
        self.log.push(format!("navigate {}", target));
        self.current = self.screens.get(&target).cloned().unwrap_or_default();
        self.url = target;
    }

    /// Make every element matching `query` on the current screen visible
    pub fn show(&mut self, query: &Query) {
        for element in self.current.elements.iter_mut() {
            if element.query == *query {
                element.visible = true;
            }
        }
    }

    pub fn set_frame_url(&mut self, index: usize, url: &str) {
        if let Some(frame) = self.current.frames.get_mut(index) {
            frame.url = url.to_string();
        }
    }

    pub fn input(&self, query: &Query) -> Option<&str> {
        self.inputs.get(query).map(String::as_str)
    }

    fn find(&self, scope: &Scope, query: &Query) -> Result<Option<&FakeElement>, DriverError> {
        let elements = match scope {
            Scope::Page => &self.current.elements,
            Scope::Frame(handle) => {
                &self
                    .current
                    .frames
                    .get(handle.index as usize)
                    .ok_or(DriverError::FrameDetached(handle.index))?
                    .elements
            }
        };
        Ok(elements.iter().find(|e| e.query == *query))
    }
}

/// In-memory [`Page`] driven by [`Screen`]s and click handlers
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        FakePage {
            state: Mutex::new(FakeState {
                url: "about:blank".to_string(),
                current: Screen::default(),
                screens: HashMap::new(),
                protected: HashSet::new(),
                login_url: String::new(),
                signed_in: true,
                handlers: Vec::new(),
                inputs: HashMap::new(),
                log: Vec::new(),
                fail_frames: false,
                fail_screenshot: false,
                closed: false,
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn screen(self, url: &str, screen: Screen) -> Self {
        self.state().screens.insert(url.to_string(), screen);
        self
    }

    /// Start on `url` without logging a navigation
    pub fn at(self, url: &str) -> Self {
        {
            let mut state = self.state();
            state.current = state.screens.get(url).cloned().unwrap_or_default();
            state.url = url.to_string();
        }
        self
    }

    /// Run `handler` when `query` is clicked; on any URL when `url` is None
    pub fn on_click(
        self,
        url: Option<&str>,
        query: Query,
        handler: impl Fn(&mut FakeState) + Send + Sync + 'static,
    ) -> Self {
        let handler: ClickHandler = Arc::new(handler);
        self.state()
            .handlers
            .push((url.map(str::to_string), query, handler));
        self
    }

    pub fn navigate_on_click(self, url: Option<&str>, query: Query, target: &str) -> Self {
        let target = target.to_string();
        self.on_click(url, query, move |state| state.navigate(&target))
    }

    pub fn fail_frames(self) -> Self {
        self.state().fail_frames = true;
        self
    }

    pub fn url(&self) -> String {
        self.state().url.clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.state().log.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.state().navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        Ok(self.url())
    }

    async fn frames(&self) -> Result<Vec<FrameHandle>, DriverError> {
        let state = self.state();
        if state.fail_frames {
            return Err(DriverError::Unavailable("frame enumeration failed".to_string()));
        }
        Ok(state
            .current
            .frames
            .iter()
            .enumerate()
            .map(|(index, frame)| FrameHandle {
                index: index as u16,
                url: frame.url.clone(),
            })
            .collect())
    }

    async fn count(&self, scope: &Scope, query: &Query) -> Result<usize, DriverError> {
        let state = self.state();
        Ok(state.find(scope, query)?.map_or(0, |e| e.texts.len().max(1)))
    }

    async fn is_visible(&self, scope: &Scope, query: &Query) -> Result<bool, DriverError> {
        let state = self.state();
        Ok(state.find(scope, query)?.is_some_and(|e| e.visible))
    }

    async fn texts(&self, scope: &Scope, query: &Query) -> Result<Vec<String>, DriverError> {
        let state = self.state();
        Ok(state
            .find(scope, query)?
            .map(|e| e.texts.clone())
            .unwrap_or_default())
    }

    async fn click(&self, scope: &Scope, query: &Query) -> Result<(), DriverError> {
        let mut state = self.state();
        if !state.find(scope, query)?.is_some_and(|e| e.visible) {
            return Err(DriverError::NoSuchElement(query.to_string()));
        }
        state.log.push(format!("click {}", query));

        let url = state.url.clone();
        let handlers: Vec<ClickHandler> = state
            .handlers
            .iter()
            .filter(|(on, q, _)| q == query && on.as_ref().is_none_or(|u| *u == url))
            .map(|(_, _, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(&mut *state);
        }
        Ok(())
    }

    async fn fill(&self, scope: &Scope, query: &Query, value: &str) -> Result<(), DriverError> {
        let mut state = self.state();
        if state.find(scope, query)?.is_none() {
            return Err(DriverError::NoSuchElement(query.to_string()));
        }
        state.log.push(format!("fill {}", query));
        state.inputs.insert(query.clone(), value.to_string());
        Ok(())
    }

    async fn press_enter(&self, _scope: &Scope, query: &Query) -> Result<(), DriverError> {
        self.state().log.push(format!("enter {}", query));
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        if self.state().fail_screenshot {
            return Err(DriverError::Unavailable("no screenshot".to_string()));
        }
        Ok(b"\x89PNG fake".to_vec())
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.state().closed = true;
        Ok(())
    }
}

/// Reporting frame URL of the primary dashboard
pub fn panel_url(config: &SuiteConfig) -> String {
    config.url("/grafana/d/qa-automation-test-project?orgId=1")
}

/// Model of the dashboard application, covering every scenario's path
pub fn dashboard_app(config: &SuiteConfig) -> FakePage {
    let s = &config.selectors;
    let login_url = config.environment.login_path.clone();
    let home_url = config.url(&config.routes.home);
    let list_url = config.url(&config.routes.dashboards);
    let profile_url = config.url(&config.routes.profile);
    let primary_url = config
        .dashboard_url(PRIMARY_DASHBOARD)
        .expect("primary dashboard has a route");
    let secondary_url = config.url(SECONDARY_PATH);
    let panel = panel_url(config);

    let shell = || {
        Screen::new()
            .with(s.user_menu.clone())
            .with(s.dashboards_nav_link.clone())
            .with(s.body.clone())
    };

    let login = Screen::new()
        .with(s.login_email.clone())
        .with(s.login_password.clone())
        .with(s.sign_in_button.clone())
        .with(s.any_email_input.clone())
        .with(s.any_password_input.clone())
        .hidden(s.login_error.clone(), &["Invalid credentials"]);

    let home = shell()
        .with(Query::heading("Home"))
        .with(Query::text(PRIMARY_DASHBOARD))
        .with(Query::link(PRIMARY_DASHBOARD))
        .with_text(s.project_card.clone(), &[PRIMARY_DASHBOARD, SECONDARY_DASHBOARD])
        .with(s.search_input.clone());

    let list = shell()
        .with(Query::heading("Dashboards"))
        .with(Query::link(PRIMARY_DASHBOARD))
        .with(Query::link(SECONDARY_DASHBOARD));

    let primary = shell()
        .with(Query::heading(PRIMARY_DASHBOARD))
        .with(s.date_filter.clone())
        .hidden(s.date_start_input.clone(), &[""])
        .hidden(s.date_end_input.clone(), &[""])
        .hidden(s.apply_button.clone(), &["Apply"])
        .with(s.content_iframe.clone())
        .with_frame(
            &panel,
            Screen::new().with(Query::text(CHART_TITLE)).with_text(
                s.table_first_column.clone(),
                &["RD:702-5151", "RD:702-5152", "RD:702-5153", "RD:702-5154"],
            ),
        );

    let secondary = shell()
        .with(Query::heading(SECONDARY_DASHBOARD))
        .with(Query::text(CHART_TITLE));

    let profile = shell()
        .with(Query::heading("Profile"))
        .with(s.sign_out_button.clone())
        .hidden(s.sign_out_prompt.clone(), &["Do you really want to sign out?"])
        .hidden(s.sign_out_confirm.clone(), &["OK"]);

    let email_query = s.login_email.clone();
    let password_query = s.login_password.clone();
    let error_query = s.login_error.clone();
    let sign_in_home = home_url.clone();
    let (start, end, apply) = (
        s.date_start_input.clone(),
        s.date_end_input.clone(),
        s.apply_button.clone(),
    );
    let (start_q, end_q) = (start.clone(), end.clone());
    let filtered_panel = panel.clone();
    let (prompt, confirm) = (s.sign_out_prompt.clone(), s.sign_out_confirm.clone());
    let signed_out_url = login_url.clone();

    let page = FakePage::new()
        .screen(&login_url, login)
        .screen(&home_url, home)
        .screen(&list_url, list)
        .screen(&primary_url, primary)
        .screen(&secondary_url, secondary)
        .screen(&profile_url, profile)
        .on_click(Some(login_url.as_str()), s.sign_in_button.clone(), move |state| {
            let valid = state.input(&email_query) == Some(STANDARD_EMAIL)
                && state.input(&password_query) == Some(STANDARD_PASSWORD);
            if valid {
                state.signed_in = true;
                state.navigate(&sign_in_home);
            } else {
                state.show(&error_query);
            }
        })
        .navigate_on_click(None, s.dashboards_nav_link.clone(), &list_url)
        .navigate_on_click(Some(home_url.as_str()), Query::text(PRIMARY_DASHBOARD), &primary_url)
        .navigate_on_click(Some(home_url.as_str()), Query::link(PRIMARY_DASHBOARD), &primary_url)
        .navigate_on_click(Some(list_url.as_str()), Query::link(PRIMARY_DASHBOARD), &primary_url)
        .navigate_on_click(Some(list_url.as_str()), Query::link(SECONDARY_DASHBOARD), &secondary_url)
        .on_click(Some(primary_url.as_str()), s.date_filter.clone(), move |state| {
            state.show(&start);
            state.show(&end);
            state.show(&apply);
        })
        .on_click(Some(primary_url.as_str()), s.apply_button.clone(), move |state| {
            let from = state.input(&start_q).unwrap_or_default().replace(' ', "%20");
            let to = state.input(&end_q).unwrap_or_default().replace(' ', "%20");
            let url = format!("{}&from={}&to={}", filtered_panel, from, to);
            state.set_frame_url(0, &url);
        })
        .on_click(Some(profile_url.as_str()), s.sign_out_button.clone(), move |state| {
            state.show(&prompt);
            state.show(&confirm);
        })
        .on_click(Some(profile_url.as_str()), s.sign_out_confirm.clone(), move |state| {
            state.signed_in = false;
            state.navigate(&signed_out_url);
        });

    {
        let mut state = page.state();
        state.login_url = login_url;
        state.signed_in = false;
        for url in [home_url, list_url, primary_url, secondary_url, profile_url] {
            state.protected.insert(url);
        }
    }
    page
}

/// Hands out fresh [`dashboard_app`] pages and counts concurrency
pub struct FakeLauncher {
    config: SuiteConfig,
    pub launched: AtomicUsize,
    pub open: Arc<AtomicUsize>,
    pub peak_open: Arc<AtomicUsize>,
    /// Launches (1-based) that should fail to start
    pub fail_launches: HashSet<usize>,
    /// Hold every page open this long before handing it out
    pub hold: Duration,
    pub customize: Option<Arc<dyn Fn(&FakePage, usize) + Send + Sync>>,
}

impl FakeLauncher {
    pub fn new(config: &SuiteConfig) -> Self {
        FakeLauncher {
            config: config.clone(),
            launched: AtomicUsize::new(0),
            open: Arc::new(AtomicUsize::new(0)),
            peak_open: Arc::new(AtomicUsize::new(0)),
            fail_launches: HashSet::new(),
            hold: Duration::ZERO,
            customize: None,
        }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn peak_open(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }
}

/// Page wrapper that tracks how many pages are open at once
struct CountedPage {
    inner: FakePage,
    open: Arc<AtomicUsize>,
}

#[async_trait]
impl Page for CountedPage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.inner.goto(url).await
    }
    async fn current_url(&self) -> Result<String, DriverError> {
        self.inner.current_url().await
    }
    async fn frames(&self) -> Result<Vec<FrameHandle>, DriverError> {
        self.inner.frames().await
    }
    async fn count(&self, scope: &Scope, query: &Query) -> Result<usize, DriverError> {
        self.inner.count(scope, query).await
    }
    async fn is_visible(&self, scope: &Scope, query: &Query) -> Result<bool, DriverError> {
        self.inner.is_visible(scope, query).await
    }
    async fn texts(&self, scope: &Scope, query: &Query) -> Result<Vec<String>, DriverError> {
        self.inner.texts(scope, query).await
    }
    async fn click(&self, scope: &Scope, query: &Query) -> Result<(), DriverError> {
        self.inner.click(scope, query).await
    }
    async fn fill(&self, scope: &Scope, query: &Query, value: &str) -> Result<(), DriverError> {
        self.inner.fill(scope, query, value).await
    }
    async fn press_enter(&self, scope: &Scope, query: &Query) -> Result<(), DriverError> {
        self.inner.press_enter(scope, query).await
    }
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.inner.screenshot().await
    }
    async fn close(&self) -> Result<(), DriverError> {
        self.open.fetch_sub(1, Ordering::SeqCst);
        self.inner.close().await
    }
}

#[async_trait]
impl PageLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn Page>, DriverError> {
        let n = self.launched.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_launches.contains(&n) {
            return Err(DriverError::Unavailable(format!("launch {} refused", n)));
        }

        let page = dashboard_app(&self.config);
        if let Some(customize) = &self.customize {
            customize(&page, n);
        }

        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_open.fetch_max(open, Ordering::SeqCst);
        if !self.hold.is_zero() {
            tokio::time::sleep(self.hold).await;
        }
        Ok(Box::new(CountedPage {
            inner: page,
            open: self.open.clone(),
        }))
    }
}
