use tracing::{debug, info};

use super::PageContext;
use crate::config::SuiteConfig;
use crate::driver::{Page, Scope};
use crate::errors::Result;
use crate::navigation::{NavigationOutcome, TieredNavigation};
use crate::types::Query;

/// Landing page after sign-in
pub struct HomePage<'a> {
    ctx: PageContext<'a>,
}

impl<'a> HomePage<'a> {
    pub fn new(page: &'a dyn Page, config: &'a SuiteConfig) -> Self {
        HomePage {
            ctx: PageContext::new(page, config),
        }
    }

    pub async fn verify_page_loaded(&self) -> Result<()> {
        self.ctx
            .expect()
            .visible(
                &Scope::Page,
                &Query::heading("Home"),
                self.ctx.config.timeouts.medium,
            )
            .await
    }

    /// Open a dashboard from the project list
    pub async fn navigate_to_dashboard(&self, name: &str) -> Result<NavigationOutcome> {
        let config = self.ctx.config;
        let timeouts = &config.timeouts;

        let mut navigation = TieredNavigation::new()
            .click("project text", Query::text(name), timeouts.medium)
            .click("project link", Query::link(name), timeouts.short);
        if let Some(url) = config.dashboard_url(name) {
            navigation = navigation.goto("direct dashboard URL", url);
        }

        info!("Opening dashboard '{}' from home", name);
        navigation.run(self.ctx.page, timeouts.poll_interval).await
    }

    pub async fn project_names(&self) -> Result<Vec<String>> {
        let names = self
            .ctx
            .page
            .texts(&Scope::Page, &self.ctx.config.selectors.project_card)
            .await?;
        Ok(names.into_iter().map(|n| n.trim().to_string()).collect())
    }

    /// Type into the project search box, if the page has one
    pub async fn search_project(&self, text: &str) -> Result<()> {
        let page = self.ctx.page;
        let search = &self.ctx.config.selectors.search_input;

        if page.count(&Scope::Page, search).await? == 0 {
            debug!("No project search box, skipping search");
            return Ok(());
        }
        page.fill(&Scope::Page, search, text).await?;
        page.press_enter(&Scope::Page, search).await?;
        Ok(())
    }
}
