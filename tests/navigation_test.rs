// Tiered fallback navigation against an in-memory page

mod common;
use common::{FakePage, Screen};
use dashprobe::navigation::TieredNavigation;
use dashprobe::types::Query;
use pretty_assertions::assert_eq;
use std::time::Duration;

const START: &str = "https://app.test/next/home";
const TARGET: &str = "https://app.test/next/dashboards";
const POLL: Duration = Duration::from_millis(5);
const TIER_TIMEOUT: Duration = Duration::from_millis(50);

fn navigation() -> TieredNavigation {
    TieredNavigation::new()
        .click("nav link", Query::link("Dashboards"), TIER_TIMEOUT)
        .click("route link", Query::css("a[href$='/next/dashboards']"), TIER_TIMEOUT)
        .goto("dashboards URL", TARGET.to_string())
}

#[tokio::test]
async fn test_first_tier_wins() {
    let page = FakePage::new()
        .screen(START, Screen::new().with(Query::link("Dashboards")))
        .at(START)
        .navigate_on_click(None, Query::link("Dashboards"), TARGET);

    let outcome = navigation().run(&page, POLL).await.unwrap();
    assert_eq!(outcome.tier, 0);
    assert_eq!(outcome.label, "nav link");
    assert_eq!(page.url(), TARGET);
    // Later tiers never ran
    assert_eq!(
        page.log(),
        vec!["click link=Dashboards".to_string(), format!("navigate {}", TARGET)]
    );
}

#[tokio::test]
async fn test_falls_back_to_alternate_locator() {
    let alternate = Query::css("a[href$='/next/dashboards']");
    let page = FakePage::new()
        .screen(START, Screen::new().with(alternate.clone()))
        .at(START)
        .navigate_on_click(None, alternate, TARGET);

    let outcome = navigation().run(&page, POLL).await.unwrap();
    assert_eq!(outcome.tier, 1);
    assert_eq!(outcome.label, "route link");
    assert_eq!(page.url(), TARGET);
}

#[tokio::test]
async fn test_hidden_primary_is_skipped() {
    let page = FakePage::new()
        .screen(START, Screen::new().hidden(Query::link("Dashboards"), &[""]))
        .at(START);

    let outcome = navigation().run(&page, POLL).await.unwrap();
    assert_eq!(outcome.tier, 2);
    assert_eq!(outcome.label, "dashboards URL");
    assert_eq!(page.url(), TARGET);
    assert!(page.log().iter().all(|entry| !entry.starts_with("click")));
}

#[tokio::test]
async fn test_exhausted_tiers_are_an_assertion_failure() {
    let page = FakePage::new().screen(START, Screen::new()).at(START);
    let err = TieredNavigation::new()
        .click("nav link", Query::link("Dashboards"), TIER_TIMEOUT)
        .click("project text", Query::text("Dashboards"), TIER_TIMEOUT)
        .run(&page, POLL)
        .await
        .unwrap_err();

    assert!(err.is_assertion());
    assert_eq!(err.exit_code(), 3);
    let message = err.to_string();
    assert!(message.contains("after 2 tier(s)"), "{}", message);
    assert!(message.contains("'project text' failed"), "{}", message);
    // Budget is the sum of the tier timeouts
    assert!(message.contains("waited 100ms"), "{}", message);
    assert_eq!(page.url(), START);
}

#[tokio::test]
async fn test_empty_navigation_fails() {
    let page = FakePage::new();
    let err = TieredNavigation::new().run(&page, POLL).await.unwrap_err();
    assert!(err.is_assertion());
    assert!(err.to_string().contains("no navigation strategy configured"));
}
