use tracing::{debug, info};

use super::PageContext;
use crate::config::SuiteConfig;
use crate::driver::{Page, Scope};
use crate::environment::Role;
use crate::errors::Result;

/// Sign-in form
pub struct LoginPage<'a> {
    ctx: PageContext<'a>,
}

impl<'a> LoginPage<'a> {
    pub fn new(page: &'a dyn Page, config: &'a SuiteConfig) -> Self {
        LoginPage {
            ctx: PageContext::new(page, config),
        }
    }

    /// Open the sign-in page and wait for the form
    pub async fn navigate(&self) -> Result<()> {
        let url = &self.ctx.config.environment.login_path;
        info!("Opening login page {}", url);
        self.ctx.page.goto(url).await?;
        self.wait_for_page_load().await
    }

    pub async fn wait_for_page_load(&self) -> Result<()> {
        let selectors = &self.ctx.config.selectors;
        let timeout = self.ctx.config.timeouts.medium;
        let expect = self.ctx.expect();

        for query in [
            &selectors.login_email,
            &selectors.login_password,
            &selectors.sign_in_button,
        ] {
            expect.visible(&Scope::Page, query, timeout).await?;
        }
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let selectors = &self.ctx.config.selectors;
        let page = self.ctx.page;

        info!("Signing in as {}", email);
        page.fill(&Scope::Page, &selectors.login_email, email).await?;
        page.fill(&Scope::Page, &selectors.login_password, password)
            .await?;
        page.click(&Scope::Page, &selectors.sign_in_button).await?;
        Ok(())
    }

    pub async fn login_as(&self, role: Role) -> Result<()> {
        let creds = self.ctx.config.credentials.get(role);
        self.login(&creds.email, &creds.password).await
    }

    pub async fn verify_error_message(&self, expected: &str) -> Result<()> {
        let query = &self.ctx.config.selectors.login_error;
        let timeout = self.ctx.config.timeouts.short;
        let expect = self.ctx.expect();

        expect.visible(&Scope::Page, query, timeout).await?;
        expect
            .text_contains(&Scope::Page, query, expected, timeout)
            .await
    }

    /// We are on the sign-in route and the form is showing
    pub async fn verify_login_page_loaded(&self) -> Result<()> {
        let config = self.ctx.config;
        let expect = self.ctx.expect();
        let timeout = config.timeouts.medium;

        expect.url_contains(&config.routes.login, timeout).await?;
        expect
            .visible(&Scope::Page, &config.selectors.login_email, timeout)
            .await?;
        expect
            .visible(&Scope::Page, &config.selectors.login_password, timeout)
            .await
    }

    /// Best-effort check that some login form is on screen, even when the
    /// URL did not change as expected
    pub async fn is_showing_login_form(&self) -> bool {
        let selectors = &self.ctx.config.selectors;
        let page = self.ctx.page;

        for query in [&selectors.any_email_input, &selectors.any_password_input] {
            if page.is_visible(&Scope::Page, query).await.unwrap_or(false) {
                return true;
            }
        }

        match page.current_url().await {
            Ok(url) => url.contains("/signin"),
            Err(e) => {
                debug!("Could not read URL: {}", e);
                false
            }
        }
    }
}
