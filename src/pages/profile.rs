use tracing::info;

use super::PageContext;
use crate::config::SuiteConfig;
use crate::driver::{Page, Scope};
use crate::errors::Result;
use crate::types::Query;

pub struct ProfilePage<'a> {
    ctx: PageContext<'a>,
}

impl<'a> ProfilePage<'a> {
    pub fn new(page: &'a dyn Page, config: &'a SuiteConfig) -> Self {
        ProfilePage {
            ctx: PageContext::new(page, config),
        }
    }

    pub async fn navigate(&self) -> Result<()> {
        let url = self.ctx.config.url(&self.ctx.config.routes.profile);
        info!("Opening profile {}", url);
        self.ctx.page.goto(&url).await?;
        self.verify_page_loaded().await
    }

    pub async fn verify_page_loaded(&self) -> Result<()> {
        self.ctx
            .expect()
            .visible(
                &Scope::Page,
                &Query::heading("Profile"),
                self.ctx.config.timeouts.medium,
            )
            .await
    }

    pub async fn click_sign_out(&self) -> Result<()> {
        let query = &self.ctx.config.selectors.sign_out_button;
        self.ctx
            .expect()
            .visible(&Scope::Page, query, self.ctx.config.timeouts.short)
            .await?;
        self.ctx.page.click(&Scope::Page, query).await?;
        Ok(())
    }

    /// Accept the "really sign out?" dialog
    pub async fn confirm_sign_out(&self) -> Result<()> {
        let selectors = &self.ctx.config.selectors;
        let expect = self.ctx.expect();
        let timeout = self.ctx.config.timeouts.short;

        expect
            .visible(&Scope::Page, &selectors.sign_out_prompt, timeout)
            .await?;
        expect
            .visible(&Scope::Page, &selectors.sign_out_confirm, timeout)
            .await?;
        self.ctx
            .page
            .click(&Scope::Page, &selectors.sign_out_confirm)
            .await?;
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.click_sign_out().await?;
        self.confirm_sign_out().await
    }
}
