use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ApiError, YearParseError};
use crate::github::USER_AGENT;
use crate::stats::format_count;
use crate::theme::Theme;

pub const DEFAULT_BASE_URL: &str = "https://github-contributions-api.jogruber.de";
pub const CHART_BASE_URL: &str = "https://ghchart.rshah.org";

/// Which contribution window to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum YearSelector {
    #[default]
    Last,
    Year(i32),
}

impl YearSelector {
    /// Human label used in contribution text.
    pub fn label(self) -> String {
        match self {
            YearSelector::Last => "the last year".to_string(),
            YearSelector::Year(year) => year.to_string(),
        }
    }
}

impl fmt::Display for YearSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearSelector::Last => f.write_str("last"),
            YearSelector::Year(year) => write!(f, "{year}"),
        }
    }
}

impl FromStr for YearSelector {
    type Err = YearParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("last") {
            return Ok(YearSelector::Last);
        }
        match s.parse::<i32>() {
            Ok(year) if s.len() == 4 && year >= 1000 => Ok(YearSelector::Year(year)),
            _ => Err(YearParseError::Invalid(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
struct Histogram {
    #[serde(default)]
    total: Value,
}

/// Sum of the numeric entries of a year-keyed `total` mapping.
///
/// Anything that is not a non-negative integer is skipped.
pub fn numeric_total(total: &Value) -> u64 {
    match total {
        Value::Object(years) => years
            .values()
            .filter_map(Value::as_u64)
            .fold(0, u64::saturating_add),
        _ => 0,
    }
}

/// Contribution text shown with the aggregated stats.
pub fn last_year_text(total: u64) -> String {
    if total > 0 {
        format!("{} contributions in the last year", format_count(total))
    } else {
        "Active contributor on GitHub".to_string()
    }
}

/// Contribution text for an explicitly selected window.
pub fn year_text(selector: YearSelector, total: u64) -> String {
    if total > 0 {
        format!(
            "{} contributions in {}",
            format_count(total),
            selector.label()
        )
    } else {
        format!("No contributions in {}", selector.label())
    }
}

/// Selector values offered to the reader: `last`, then every year from `current_year`
/// down to `start_year`.
pub fn year_options(current_year: i32, start_year: i32) -> Vec<String> {
    std::iter::once(YearSelector::Last.to_string())
        .chain((start_year..=current_year).rev().map(|y| y.to_string()))
        .collect()
}

/// Contribution chart image for the given window, tinted for `theme`.
pub fn chart_url(selector: YearSelector, theme: Theme, account: &str) -> String {
    let color = theme.chart_color();
    match selector {
        YearSelector::Last => format!("{CHART_BASE_URL}/{color}/{account}"),
        YearSelector::Year(year) => format!("{CHART_BASE_URL}/{year}/{color}/{account}"),
    }
}

#[derive(Clone)]
pub struct ContributionsClient {
    http: Arc<Client>,
    base_url: Arc<str>,
}

impl ContributionsClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build contributions HTTP client")?;

        Ok(Self {
            http: Arc::new(http),
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').into();
        self
    }

    /// Total contributions for `account` in the selected window.
    pub async fn total(&self, account: &str, selector: YearSelector) -> Result<u64> {
        let url = format!("{}/v4/{account}", self.base_url);
        log::debug!("GET {url}?y={selector}");

        let resp = self
            .http
            .get(&url)
            .query(&[("y", selector.to_string())])
            .send()
            .await
            .context("Network error fetching contribution histogram")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            }
            .into());
        }

        let histogram: Histogram = resp
            .json()
            .await
            .context("Failed to parse contribution histogram")?;

        Ok(numeric_total(&histogram.total))
    }

    /// Contribution text for a caller-selected window. Never fails; errors become
    /// `"Active contributor in <window>"`.
    pub async fn select_year(&self, account: &str, selector: YearSelector) -> String {
        match self.total(account, selector).await {
            Ok(total) => year_text(selector, total),
            Err(e) => {
                log::error!("Error fetching contribution count: {e:#}");
                format!("Active contributor in {}", selector.label())
            }
        }
    }
}
