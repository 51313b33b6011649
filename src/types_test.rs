// Unit tests for types module

use super::*;

#[test]
fn test_viewport_size_parse() {
    // Valid formats
    let size = ViewportSize::parse("1920x1080").unwrap();
    assert_eq!(size.width, 1920);
    assert_eq!(size.height, 1080);

    let size = ViewportSize::parse("1280x720").unwrap();
    assert_eq!(size, ViewportSize::default());

    // Invalid formats
    assert!(ViewportSize::parse("1920").is_err());
    assert!(ViewportSize::parse("1920x").is_err());
    assert!(ViewportSize::parse("x1080").is_err());
    assert!(ViewportSize::parse("1920X1080").is_err()); // uppercase X
}

#[test]
fn test_default_timeouts() {
    let timeouts = Timeouts::default();
    assert_eq!(timeouts.get(TimeoutClass::Short), Duration::from_secs(5));
    assert_eq!(timeouts.get(TimeoutClass::Medium), Duration::from_secs(10));
    assert_eq!(timeouts.get(TimeoutClass::Long), Duration::from_secs(20));
    assert_eq!(timeouts.get(TimeoutClass::ChartLoad), Duration::from_secs(30));
}

#[test]
fn test_uniform_timeouts_cap_poll_interval() {
    let timeouts = Timeouts::uniform(Duration::from_millis(5));
    assert_eq!(timeouts.long, Duration::from_millis(5));
    assert_eq!(timeouts.poll_interval, Duration::from_millis(5));

    let timeouts = Timeouts::uniform(Duration::from_millis(200));
    assert_eq!(timeouts.poll_interval, Duration::from_millis(10));
}

#[test]
fn test_xpath_literal_quoting() {
    assert_eq!(xpath_literal("Sign In"), "'Sign In'");
    assert_eq!(xpath_literal("it's"), "\"it's\"");
    assert_eq!(
        xpath_literal(r#"say "it's""#),
        r#"concat('say "it', "'", 's"')"#
    );
}

#[test]
fn test_query_lookup() {
    assert_eq!(
        Query::css("iframe").lookup(),
        Lookup::Css("iframe".to_string())
    );
    assert_eq!(
        Query::link("QA Automation test Project").lookup(),
        Lookup::XPath("//a[normalize-space()='QA Automation test Project']".to_string())
    );

    match Query::text("RD:702-5151 (614) power & energy").lookup() {
        Lookup::XPath(xpath) => {
            assert!(xpath.contains("contains(normalize-space(.), 'RD:702-5151 (614) power & energy')"))
        }
        other => panic!("expected xpath, got {:?}", other),
    }

    match Query::heading("Dashboards").lookup() {
        Lookup::XPath(xpath) => {
            assert!(xpath.contains("@role='heading'"));
            assert!(xpath.ends_with("'abcdefghijklmnopqrstuvwxyz'), 'dashboards')]"));
            assert!(xpath.contains("translate(normalize-space(.), 'ABCDEFGHIJKLMNOPQRSTUVWXYZ'"));
        }
        other => panic!("expected xpath, got {:?}", other),
    }
}

#[test]
fn test_query_serde_shape() {
    let query: Query = serde_json::from_str(r#"{"by":"button","value":"Sign In"}"#).unwrap();
    assert_eq!(query, Query::button("Sign In"));

    let json = serde_json::to_value(Query::css("body")).unwrap();
    assert_eq!(json["by"], "css");
    assert_eq!(json["value"], "body");
}

#[test]
fn test_query_display() {
    assert_eq!(Query::heading("Profile").to_string(), "heading=Profile");
    assert_eq!(Query::css("body").to_string(), "css=body");
}
