//! Local stand-in for the dashboard application.
//!
//! Serves the same routes, element ids and test ids the suite's default
//! selectors expect, so the `local` environment can run every scenario
//! without network access. The primary dashboard embeds its chart in a
//! reporting frame; the secondary one renders the chart inline.

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::environment::CredentialSet;

const SESSION_COOKIE: &str = "dashprobe_session";

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<Mutex<HashSet<String>>>,
    accounts: Arc<Vec<(String, String)>>,
    next_session: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(credentials: &CredentialSet) -> Self {
        let accounts = [&credentials.standard, &credentials.admin, &credentials.readonly]
            .into_iter()
            .map(|c| (c.email.clone(), c.password.clone()))
            .collect();
        AppState {
            sessions: Arc::new(Mutex::new(HashSet::new())),
            accounts: Arc::new(accounts),
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    async fn is_signed_in(&self, headers: &HeaderMap) -> bool {
        match session_token(headers) {
            Some(token) => self.sessions.lock().await.contains(&token),
            None => false,
        }
    }
}

#[derive(Deserialize)]
struct SignInForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct PanelQuery {
    from: Option<String>,
    to: Option<String>,
}

struct DashboardFixture {
    id: &'static str,
    slug: &'static str,
    title: &'static str,
    embedded: bool,
}

const DASHBOARDS: &[DashboardFixture] = &[
    DashboardFixture {
        id: "2082",
        slug: "qa-automation-test-project",
        title: "QA Automation test Project",
        embedded: true,
    },
    DashboardFixture {
        id: "2090",
        slug: "pavi-qa-test",
        title: "Pavi Qa test",
        embedded: false,
    },
];

const CHART_TITLE: &str = "RD:702-5151 (614) power &amp; energy";

pub fn create_app(credentials: &CredentialSet) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/next/home") }))
        .route("/next/signin", get(sign_in_page).post(handle_sign_in))
        .route("/next/signout", get(handle_sign_out))
        .route("/next/home", get(home_page))
        .route("/next/dashboards", get(dashboards_page))
        .route("/next/dashboards/g/:id/:slug", get(dashboard_page))
        .route("/next/profile", get(profile_page))
        .route("/grafana/d/:slug", get(panel_page))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(credentials))
}

/// Serve the app on `addr` until the task is dropped
pub async fn serve(addr: SocketAddr, credentials: &CredentialSet) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(listener, credentials).await
}

pub async fn serve_on(
    listener: tokio::net::TcpListener,
    credentials: &CredentialSet,
) -> anyhow::Result<()> {
    info!("Local application listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(credentials)).await?;
    Ok(())
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title>
<style>
  .hidden {{ display: none; }}
  header {{ display: flex; gap: 1rem; }}
</style>
</head>
<body>
{body}
</body>
</html>"#
    ))
}

fn shell(title: &str, content: &str) -> Html<String> {
    layout(
        title,
        &format!(
            r#"<header>
  <a href="/next/home">Home</a>
  <a href="/next/dashboards">Dashboards</a>
  <a href="/next/profile"><span data-testid="PersonOutlineOutlinedIcon">Account</span></a>
</header>
<main>
{content}
</main>"#
        ),
    )
}

fn sign_in_form(error: Option<&str>) -> Html<String> {
    let error = error
        .map(|msg| {
            format!(
                r#"<p class="MuiTypography-root MuiTypography-body1 mui-hv915t">{}</p>"#,
                msg
            )
        })
        .unwrap_or_default();
    layout(
        "Sign in",
        &format!(
            r#"<h1>Sign in</h1>
<form method="POST" action="/next/signin">
  <input id=":R2ij7ulqjt9kq:" type="email" name="email" placeholder="Email">
  <input id=":R6jj7ulqjt9kq:" type="password" name="password" placeholder="Password">
  {error}
  <button type="submit">Sign In</button>
</form>"#
        ),
    )
}

async fn sign_in_page() -> Html<String> {
    sign_in_form(None)
}

async fn handle_sign_in(State(state): State<AppState>, Form(form): Form<SignInForm>) -> Response {
    let valid = state
        .accounts
        .iter()
        .any(|(email, password)| *email == form.email && *password == form.password);
    if !valid {
        debug!("Rejected sign-in for {}", form.email);
        return sign_in_form(Some("Invalid credentials")).into_response();
    }

    let token = format!("s{}", state.next_session.fetch_add(1, Ordering::Relaxed));
    state.sessions.lock().await.insert(token.clone());
    debug!("Signed in {}", form.email);

    (
        [(
            header::SET_COOKIE,
            format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, token),
        )],
        Redirect::to("/next/home"),
    )
        .into_response()
}

async fn handle_sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.lock().await.remove(&token);
    }
    (
        [(
            header::SET_COOKIE,
            format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE),
        )],
        Redirect::to("/next/signin"),
    )
        .into_response()
}

async fn home_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.is_signed_in(&headers).await {
        return Redirect::to("/next/signin").into_response();
    }
    let projects: String = DASHBOARDS
        .iter()
        .map(|d| {
            format!(
                r#"  <li><a class="project-card" href="/next/dashboards/g/{}/{}">{}</a></li>"#,
                d.id, d.slug, d.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    shell(
        "Home",
        &format!(
            r#"<h1>Home</h1>
<input type="search" placeholder="Search projects">
<ul>
{projects}
</ul>"#
        ),
    )
    .into_response()
}

async fn dashboards_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.is_signed_in(&headers).await {
        return Redirect::to("/next/signin").into_response();
    }
    let rows: String = DASHBOARDS
        .iter()
        .map(|d| {
            format!(
                r#"  <li><a href="/next/dashboards/g/{}/{}">{}</a></li>"#,
                d.id, d.slug, d.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    shell("Dashboards", &format!("<h1>Dashboards</h1>\n<ul>\n{rows}\n</ul>")).into_response()
}

async fn dashboard_page(
    State(state): State<AppState>,
    Path((id, slug)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !state.is_signed_in(&headers).await {
        return Redirect::to("/next/signin").into_response();
    }
    let Some(dashboard) = DASHBOARDS.iter().find(|d| d.id == id && d.slug == slug) else {
        return shell("Not found", "<h1>Dashboard not found</h1>").into_response();
    };

    let content = if dashboard.embedded {
        format!(
            r#"<iframe id="panel" src="/grafana/d/{slug}?orgId=1" width="900" height="400"></iframe>"#,
            slug = dashboard.slug
        )
    } else {
        panel_body(None, None)
    };

    shell(
        dashboard.title,
        &format!(
            r#"<h1>{title}</h1>
<button data-testid="BrainsDateTimeRangeButton" onclick="document.getElementById('picker').classList.remove('hidden')">Last 7 days</button>
<div id="picker" class="hidden">
  <input data-testid="BrainsDateTimePickerHistoric-startInput" id="range-start">
  <input data-testid="BrainsDateTimePickerHistoric-endInput" id="range-end">
  <button onclick="applyRange()">Apply</button>
</div>
{content}
<script>
function applyRange() {{
  var from = encodeURIComponent(document.getElementById('range-start').value);
  var to = encodeURIComponent(document.getElementById('range-end').value);
  var frame = document.getElementById('panel');
  if (frame) {{
    frame.src = '/grafana/d/{slug}?orgId=1&from=' + from + '&to=' + to;
  }}
  document.getElementById('picker').classList.add('hidden');
}}
</script>"#,
            title = dashboard.title,
            slug = dashboard.slug,
        ),
    )
    .into_response()
}

fn panel_body(from: Option<&str>, to: Option<&str>) -> String {
    let range = match (from, to) {
        (Some(from), Some(to)) => format!("{} to {}", from, to),
        _ => "Last 7 days".to_string(),
    };
    format!(
        r#"<section class="panel">
  <h2>{CHART_TITLE}</h2>
  <p class="range">{range}</p>
  <div role="table">
    <div role="row"><div role="cell">RD:702-5151</div><div role="cell">614 kW</div></div>
    <div role="row"><div role="cell">RD:702-5152</div><div role="cell">598 kW</div></div>
    <div role="row"><div role="cell">RD:702-5153</div><div role="cell">633 kW</div></div>
    <div role="row"><div role="cell">RD:702-5154</div><div role="cell">601 kW</div></div>
  </div>
</section>"#
    )
}

async fn panel_page(Path(slug): Path<String>, Query(query): Query<PanelQuery>) -> Html<String> {
    debug!("Panel {} requested for {:?}..{:?}", slug, query.from, query.to);
    layout(
        "Panel",
        &panel_body(query.from.as_deref(), query.to.as_deref()),
    )
}

async fn profile_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !state.is_signed_in(&headers).await {
        return Redirect::to("/next/signin").into_response();
    }
    shell(
        "Profile",
        r#"<h1>Profile</h1>
<button onclick="document.getElementById('confirm').classList.remove('hidden')">Sign Out</button>
<div id="confirm" role="dialog" class="hidden">
  <p>Do you really want to sign out?</p>
  <button data-testid="ConfirmedActionButton-dialog-ok" onclick="window.location.href='/next/signout'">OK</button>
</div>"#,
    )
    .into_response()
}

#[cfg(test)]
#[path = "mock_app_test.rs"]
mod mock_app_test;
