use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Output format for CLI results
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON report for programmatic consumption
    Json,
    /// Human-readable list, one line per scenario
    Simple,
}

/// Named timeout classes used by waits and assertions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeoutClass {
    Short,
    Medium,
    Long,
    ChartLoad,
}

/// Bounds for every wait the suite performs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub short: Duration,
    pub medium: Duration,
    pub long: Duration,
    pub chart_load: Duration,
    /// Delay between two probes of a polling wait
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            short: Duration::from_secs(5),
            medium: Duration::from_secs(10),
            long: Duration::from_secs(20),
            chart_load: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl Timeouts {
    /// Every class bounded by the same duration; handy for fast test runs
    pub fn uniform(limit: Duration) -> Self {
        Self {
            short: limit,
            medium: limit,
            long: limit,
            chart_load: limit,
            poll_interval: Duration::from_millis(10).min(limit),
        }
    }

    pub fn get(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Short => self.short,
            TimeoutClass::Medium => self.medium,
            TimeoutClass::Long => self.long,
            TimeoutClass::ChartLoad => self.chart_load,
        }
    }
}

/// A deferred element query, re-evaluated every time it is used.
///
/// Queries never hold on to a matched element. The driver turns them into a
/// concrete [`Lookup`] on each call, so a re-rendered page is always queried
/// fresh.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Query {
    /// Raw CSS selector
    Css(String),
    /// Raw XPath expression
    XPath(String),
    /// Any element whose own text contains the string
    Text(String),
    /// Heading (h1-h6 or role=heading) with exactly this name
    Heading(String),
    /// Button (or role=button) whose text contains the string
    Button(String),
    /// Anchor with exactly this normalized text
    Link(String),
}

/// Concrete WebDriver lookup strategy for a [`Query`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    Css(String),
    XPath(String),
}

impl Query {
    pub fn css(selector: impl Into<String>) -> Self {
        Query::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Query::Text(text.into())
    }

    pub fn heading(name: impl Into<String>) -> Self {
        Query::Heading(name.into())
    }

    pub fn button(name: impl Into<String>) -> Self {
        Query::Button(name.into())
    }

    pub fn link(text: impl Into<String>) -> Self {
        Query::Link(text.into())
    }

    pub fn lookup(&self) -> Lookup {
        match self {
            Query::Css(css) => Lookup::Css(css.clone()),
            Query::XPath(xpath) => Lookup::XPath(xpath.clone()),
            Query::Text(text) => Lookup::XPath(format!(
                "//*[text()[contains(normalize-space(.), {})]]",
                xpath_literal(text)
            )),
            // Case-insensitive substring, like an accessible-name match
            Query::Heading(name) => Lookup::XPath(format!(
                "//*[self::h1 or self::h2 or self::h3 or self::h4 or self::h5 or self::h6 \
                 or @role='heading'][contains(translate(normalize-space(.), '{}', '{}'), {})]",
                ASCII_UPPER,
                ASCII_LOWER,
                xpath_literal(&name.to_ascii_lowercase())
            )),
            Query::Button(name) => Lookup::XPath(format!(
                "//*[self::button or @role='button'][contains(normalize-space(.), {})]",
                xpath_literal(name)
            )),
            Query::Link(text) => Lookup::XPath(format!(
                "//a[normalize-space()={}]",
                xpath_literal(text)
            )),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Css(css) => write!(f, "css={}", css),
            Query::XPath(xpath) => write!(f, "xpath={}", xpath),
            Query::Text(text) => write!(f, "text={}", text),
            Query::Heading(name) => write!(f, "heading={}", name),
            Query::Button(name) => write!(f, "button={}", name),
            Query::Link(text) => write!(f, "link={}", text),
        }
    }
}

const ASCII_UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ASCII_LOWER: &str = "abcdefghijklmnopqrstuvwxyz";

/// Quote a string as an XPath 1.0 literal.
///
/// XPath has no escape sequences, so a value holding both quote kinds is
/// spliced together with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Browser viewport dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl ViewportSize {
    /// Parse viewport size from "WIDTHxHEIGHT" format (e.g., "1280x720")
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid viewport format. Use WIDTHxHEIGHT (e.g., 1280x720)");
        }

        let width = parts[0]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in viewport size"))?;
        let height = parts[1]
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in viewport size"))?;

        Ok(ViewportSize { width, height })
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
