//! Selector registry: symbolic names for every UI element the suite touches.
//!
//! Selector strings are data. The defaults below track the current
//! application build; a JSON file can replace any subset of them for another
//! build without touching page-object logic.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{Result, SuiteError};
use crate::types::Query;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    // Login form
    pub login_email: Query,
    pub login_password: Query,
    pub sign_in_button: Query,
    pub login_error: Query,
    /// Generic inputs used to recognise a login form when ids change
    pub any_email_input: Query,
    pub any_password_input: Query,

    // Shell
    pub user_menu: Query,
    pub dashboards_nav_link: Query,
    pub dashboards_nav_alternate: Query,

    // Home
    pub project_card: Query,
    pub search_input: Query,

    // Dashboard
    pub date_filter: Query,
    pub date_start_input: Query,
    pub date_end_input: Query,
    pub apply_button: Query,
    /// The embedded reporting panel's iframe element
    pub content_iframe: Query,
    pub body: Query,
    /// First-column cells of the first table-like structure
    pub table_first_column: Query,

    // Profile
    pub sign_out_button: Query,
    pub sign_out_prompt: Query,
    pub sign_out_confirm: Query,
}

impl Default for Selectors {
    fn default() -> Self {
        Selectors {
            login_email: Query::css(r#"input[id=":R2ij7ulqjt9kq:"]"#),
            login_password: Query::css(r#"input[id=":R6jj7ulqjt9kq:"]"#),
            sign_in_button: Query::button("Sign In"),
            login_error: Query::css(".MuiTypography-root.MuiTypography-body1.mui-hv915t"),
            any_email_input: Query::css(r#"input[type="email"]"#),
            any_password_input: Query::css(r#"input[type="password"]"#),

            user_menu: Query::css(r#"[data-testid="PersonOutlineOutlinedIcon"]"#),
            dashboards_nav_link: Query::XPath(
                "//a[contains(normalize-space(.), 'Dashboards')]".to_string(),
            ),
            dashboards_nav_alternate: Query::css(r#"a[href$="/next/dashboards"]"#),

            project_card: Query::css(".project-card"),
            search_input: Query::css(r#"input[placeholder*="Search"]"#),

            date_filter: Query::css(r#"[data-testid="BrainsDateTimeRangeButton"]"#),
            date_start_input: Query::css(
                r#"[data-testid="BrainsDateTimePickerHistoric-startInput"]"#,
            ),
            date_end_input: Query::css(r#"[data-testid="BrainsDateTimePickerHistoric-endInput"]"#),
            apply_button: Query::button("Apply"),
            content_iframe: Query::css(r#"iframe[src*="grafana"]"#),
            body: Query::css("body"),
            table_first_column: Query::XPath(
                "(//*[@role='table' or self::table])[1]\
                 //*[@role='row' or self::tr]/*[@role='cell' or @role='gridcell' or self::td][1]"
                    .to_string(),
            ),

            sign_out_button: Query::button("Sign Out"),
            sign_out_prompt: Query::text("Do you really want to sign out?"),
            sign_out_confirm: Query::css(r#"[data-testid="ConfirmedActionButton-dialog-ok"]"#),
        }
    }
}

impl Selectors {
    /// Load selectors from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SuiteError::config(format!("Cannot read selector file {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
            .map_err(|e| SuiteError::config(format!("{} ({})", e, path.display())))
    }

    pub fn from_json(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Application routes, relative to the environment base URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Routes {
    pub login: String,
    pub home: String,
    pub dashboards: String,
    pub profile: String,
}

impl Default for Routes {
    fn default() -> Self {
        Routes {
            login: "/next/signin".to_string(),
            home: "/next/home".to_string(),
            dashboards: "/next/dashboards".to_string(),
            profile: "/next/profile".to_string(),
        }
    }
}

/// A dashboard the suite knows by name
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DashboardRef {
    pub name: String,
    /// Direct route, when known; enables the direct-URL navigation tier
    pub path: Option<String>,
}

impl DashboardRef {
    pub fn new(name: &str, path: Option<&str>) -> Self {
        DashboardRef {
            name: name.to_string(),
            path: path.map(str::to_string),
        }
    }
}

pub fn default_dashboards() -> Vec<DashboardRef> {
    vec![
        DashboardRef::new(
            "QA Automation test Project",
            Some("/next/dashboards/g/2082/qa-automation-test-project"),
        ),
        DashboardRef::new("Pavi Qa test", None),
    ]
}
