use chrono::NaiveDateTime;
use std::fmt;
use tracing::info;

use super::PageContext;
use crate::config::SuiteConfig;
use crate::driver::{Page, Scope};
use crate::errors::{Result, SuiteError};
use crate::expect::poll_until;
use crate::frames::{ChartLocation, FrameResolver, Resolution};
use crate::navigation::{NavigationOutcome, TieredNavigation};
use crate::types::Query;

/// Format accepted by the dashboard's date-time inputs
pub const DATE_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Query parameter the reporting frame carries once a range is applied
pub const RANGE_PARAM: &str = "from=";

/// Inclusive date-time range for the dashboard filter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    /// Parse two `YYYY-MM-DD HH:MM` values; `from` must not be after `to`
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let parse = |value: &str| {
            NaiveDateTime::parse_from_str(value.trim(), DATE_INPUT_FORMAT).map_err(|e| {
                SuiteError::config(format!(
                    "Invalid date '{}' (expected YYYY-MM-DD HH:MM): {}",
                    value, e
                ))
            })
        };
        let range = DateRange {
            from: parse(from)?,
            to: parse(to)?,
        };
        if range.from > range.to {
            return Err(SuiteError::config(format!(
                "Date range starts after it ends: {}",
                range
            )));
        }
        Ok(range)
    }

    pub fn from_input(&self) -> String {
        self.from.format(DATE_INPUT_FORMAT).to_string()
    }

    pub fn to_input(&self) -> String {
        self.to.format(DATE_INPUT_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.from_input(), self.to_input())
    }
}

/// A single dashboard, identified by its title
pub struct DashboardPage<'a> {
    ctx: PageContext<'a>,
    title: String,
}

impl<'a> DashboardPage<'a> {
    pub fn new(page: &'a dyn Page, config: &'a SuiteConfig, title: &str) -> Self {
        DashboardPage {
            ctx: PageContext::new(page, config),
            title: title.to_string(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn frames(&self) -> FrameResolver<'a> {
        FrameResolver::from_config(self.ctx.config)
    }

    /// Open this dashboard by URL; requires a catalogued route
    pub async fn navigate(&self) -> Result<()> {
        let url = self.ctx.config.dashboard_url(&self.title).ok_or_else(|| {
            SuiteError::config(format!("No route known for dashboard '{}'", self.title))
        })?;
        info!("Opening dashboard {}", url);
        self.ctx.page.goto(&url).await?;
        self.verify_page_loaded().await
    }

    /// Open this dashboard's URL without checking the outcome; used to probe
    /// access control
    pub async fn navigate_directly_without_auth(&self) -> Result<()> {
        let url = self.ctx.config.dashboard_url(&self.title).ok_or_else(|| {
            SuiteError::config(format!("No route known for dashboard '{}'", self.title))
        })?;
        self.ctx.page.goto(&url).await?;
        Ok(())
    }

    pub async fn verify_page_loaded(&self) -> Result<()> {
        self.verify_page_title(&self.title).await
    }

    pub async fn verify_page_title(&self, title: &str) -> Result<()> {
        self.ctx
            .expect()
            .visible(
                &Scope::Page,
                &Query::heading(title),
                self.ctx.config.timeouts.medium,
            )
            .await
    }

    pub async fn open_user_menu(&self) -> Result<()> {
        self.ctx
            .page
            .click(&Scope::Page, &self.ctx.config.selectors.user_menu)
            .await?;
        Ok(())
    }

    pub async fn verify_user_menu_visible(&self) -> Result<()> {
        super::verify_logged_in(self.ctx.page, self.ctx.config).await
    }

    /// Go to the dashboards list: nav link, then any link to the list route,
    /// then the list URL itself
    pub async fn navigate_to_dashboards_list(&self) -> Result<NavigationOutcome> {
        let config = self.ctx.config;
        let timeouts = &config.timeouts;

        let outcome = TieredNavigation::new()
            .click(
                "dashboards nav link",
                config.selectors.dashboards_nav_link.clone(),
                timeouts.short,
            )
            .click(
                "dashboards route link",
                config.selectors.dashboards_nav_alternate.clone(),
                timeouts.short,
            )
            .goto("dashboards URL", config.url(&config.routes.dashboards))
            .run(self.ctx.page, timeouts.poll_interval)
            .await?;

        let expect = self.ctx.expect();
        expect
            .url_contains(&config.routes.dashboards, timeouts.medium)
            .await?;
        expect
            .visible(
                &Scope::Page,
                &Query::heading("Dashboards"),
                timeouts.medium,
            )
            .await?;
        Ok(outcome)
    }

    /// Open another dashboard through the dashboards list
    pub async fn navigate_to_dashboard(&self, name: &str) -> Result<NavigationOutcome> {
        self.navigate_to_dashboards_list().await?;

        let config = self.ctx.config;
        let timeouts = &config.timeouts;
        let mut navigation = TieredNavigation::new()
            .click("dashboard link", Query::link(name), timeouts.medium)
            .click("dashboard text", Query::text(name), timeouts.short);
        if let Some(url) = config.dashboard_url(name) {
            navigation = navigation.goto("direct dashboard URL", url);
        }

        info!("Opening dashboard '{}'", name);
        let outcome = navigation.run(self.ctx.page, timeouts.poll_interval).await?;
        self.verify_page_title(name).await?;
        Ok(outcome)
    }

    pub async fn open_date_filter(&self) -> Result<()> {
        let query = &self.ctx.config.selectors.date_filter;
        self.ctx
            .expect()
            .visible(&Scope::Page, query, self.ctx.config.timeouts.medium)
            .await?;
        self.ctx.page.click(&Scope::Page, query).await?;
        Ok(())
    }

    pub async fn set_date_range_filter(&self, range: &DateRange) -> Result<()> {
        let selectors = &self.ctx.config.selectors;
        let page = self.ctx.page;

        self.ctx
            .expect()
            .visible(
                &Scope::Page,
                &selectors.date_start_input,
                self.ctx.config.timeouts.short,
            )
            .await?;
        page.fill(&Scope::Page, &selectors.date_start_input, &range.from_input())
            .await?;
        page.fill(&Scope::Page, &selectors.date_end_input, &range.to_input())
            .await?;
        Ok(())
    }

    pub async fn apply_date_filter(&self) -> Result<()> {
        self.ctx
            .page
            .click(&Scope::Page, &self.ctx.config.selectors.apply_button)
            .await?;
        Ok(())
    }

    pub async fn filter_by_date_range(&self, range: &DateRange) -> Result<()> {
        info!("Filtering '{}' by {}", self.title, range);
        self.open_date_filter().await?;
        self.set_date_range_filter(range).await?;
        self.apply_date_filter().await
    }

    /// After a filter: the content frame's URL carries the range. Without a
    /// content frame there is nothing to check beyond the page being alive.
    ///
    /// Returns the content frame URL that satisfied the check.
    pub async fn verify_filter_applied(&self) -> Result<Option<String>> {
        let config = self.ctx.config;
        let page = self.ctx.page;
        let frames = self.frames();
        let timeout = config.timeouts.medium;
        let reload = config.timeouts.chart_load;
        let expect = self.ctx.expect();

        match frames.resolve_content_frame(page).await {
            Resolution::Found(_) => {
                // The frame may be recreated by the filter, so resolve on every probe
                let frames = &frames;
                let applied = poll_until(reload, config.timeouts.poll_interval, || async move {
                    Ok(frames
                        .content_frame_url(page)
                        .await
                        .is_some_and(|url| url.contains(RANGE_PARAM)))
                })
                .await;

                let url = frames.content_frame_url(page).await;
                if !applied {
                    return Err(SuiteError::assertion(
                        format!(
                            "content frame URL to contain '{}' (last: {})",
                            RANGE_PARAM,
                            url.as_deref().unwrap_or("<detached>")
                        ),
                        reload,
                    ));
                }
                expect
                    .visible(&Scope::Page, &config.selectors.content_iframe, timeout)
                    .await?;
                Ok(url)
            }
            _ => {
                expect
                    .visible(&Scope::Page, &config.selectors.body, timeout)
                    .await?;
                Ok(None)
            }
        }
    }

    pub async fn wait_for_chart_visible(&self, chart_title: &str) -> Result<ChartLocation> {
        self.frames()
            .wait_for_chart_visible(self.ctx.page, chart_title)
            .await
    }

    pub async fn table_snapshot(&self) -> Vec<String> {
        self.frames().read_table_snapshot(self.ctx.page).await
    }

    pub async fn log_frame_details(&self) {
        self.frames().log_frame_details(self.ctx.page).await
    }
}

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;
