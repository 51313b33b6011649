//! Page objects: intention-revealing operations over a [`Page`].
//!
//! Every page object borrows the page handle and the suite configuration;
//! neither is owned or mutated. Build them where they are needed.

mod dashboard;
mod home;
mod login;
mod profile;

pub use dashboard::{DashboardPage, DateRange};
pub use home::HomePage;
pub use login::LoginPage;
pub use profile::ProfilePage;

use crate::config::SuiteConfig;
use crate::driver::{Page, Scope};
use crate::errors::Result;
use crate::expect::Expect;

/// Page handle plus configuration, shared by every page object
#[derive(Clone, Copy)]
pub(crate) struct PageContext<'a> {
    pub page: &'a dyn Page,
    pub config: &'a SuiteConfig,
}

impl<'a> PageContext<'a> {
    pub fn new(page: &'a dyn Page, config: &'a SuiteConfig) -> Self {
        PageContext { page, config }
    }

    pub fn expect(&self) -> Expect<'a> {
        Expect::new(self.page, self.config.timeouts.poll_interval)
    }
}

/// The user menu is visible: we are signed in
pub async fn verify_logged_in(page: &dyn Page, config: &SuiteConfig) -> Result<()> {
    let ctx = PageContext::new(page, config);
    ctx.expect()
        .visible(&Scope::Page, &config.selectors.user_menu, config.timeouts.medium)
        .await
}

/// The login form is visible: we are signed out
pub async fn verify_logged_out(page: &dyn Page, config: &SuiteConfig) -> Result<()> {
    let ctx = PageContext::new(page, config);
    let expect = ctx.expect();
    expect
        .visible(&Scope::Page, &config.selectors.login_email, config.timeouts.medium)
        .await?;
    expect
        .visible(
            &Scope::Page,
            &config.selectors.sign_in_button,
            config.timeouts.medium,
        )
        .await
}
