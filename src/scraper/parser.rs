//! Odds page parser
//!
//! This module turns a rendered odds page into [`Item`] records. Each game
//! row is parsed on its own: a missing or malformed field is logged and
//! replaced by a sentinel, and only a row without any team name is dropped.
//! The whole page is rejected only when it is empty or lacks the odds
//! container entirely.
//!
//! # Page Layout
//!
//! | Field | Source |
//! |-------|--------|
//! | game rows | `.row.justify-content-md-center .col.col-md` |
//! | teams | `a.text-muted` (first = away, second = home) |
//! | league | `a[href*='betting-trends?f=']`, value of `f` upper-cased |
//! | period | `span.badge.badge-light` |
//! | moneyline / spread / total | `td:nth-child(2/3/4) span.text-muted`, index 0 is the header |
//! | event date | `time[datetime]` in the row, else the page `#datepicker` |

use crate::model::{EventDate, Item, Line, Market};
use crate::ParseError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Wrapper around all game rows; its absence means the page is not an odds page
pub const CONTAINER_SELECTOR: &str = ".row.justify-content-md-center";

const ROW_SELECTOR: &str = ".row.justify-content-md-center .col.col-md";
const TEAM_SELECTOR: &str = "a.text-muted";
const LEAGUE_SELECTOR: &str = "a[href*='betting-trends?f=']";
const PERIOD_SELECTOR: &str = "span.badge.badge-light";
const ROW_TIME_SELECTOR: &str = "time[datetime]";
const DATEPICKER_SELECTOR: &str = "#datepicker";

const MONEYLINE_COLUMN: usize = 2;
const SPREAD_COLUMN: usize = 3;
const TOTAL_COLUMN: usize = 4;

/// Period used when a row carries no period badge
pub const DEFAULT_PERIOD: &str = "FULL GAME";

const DATEPICKER_FORMAT: &str = "%m-%d-%Y";

/// Parser for the odds listing page
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser;

impl RecordParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses every game row in `content`, stamping items with the current time
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Item>)` - Items in page order; may be empty if the container has no rows
    /// * `Err(ParseError)` - The content is empty or is not an odds page
    ///
    /// # Example
    ///
    /// ```
    /// use odds_ripple::scraper::RecordParser;
    ///
    /// let html = r#"<div class="row justify-content-md-center"></div>"#;
    /// let items = RecordParser::new().parse(html).unwrap();
    /// assert!(items.is_empty());
    /// ```
    pub fn parse(&self, content: &str) -> Result<Vec<Item>, ParseError> {
        self.parse_at(content, Utc::now())
    }

    /// Same as [`RecordParser::parse`] with an explicit extraction timestamp
    pub fn parse_at(
        &self,
        content: &str,
        scraped_at: DateTime<Utc>,
    ) -> Result<Vec<Item>, ParseError> {
        if content.trim().is_empty() {
            return Err(ParseError::EmptyContent);
        }

        let document = Html::parse_document(content);
        let root = document.root_element();

        if select_all(root, CONTAINER_SELECTOR).is_empty() {
            return Err(ParseError::MissingContainer {
                selector: CONTAINER_SELECTOR,
            });
        }

        let page_date = extract_page_date(root);
        let mut items = Vec::new();

        for (index, row) in select_all(root, ROW_SELECTOR).into_iter().enumerate() {
            match parse_row(index, row, page_date, scraped_at) {
                Some(item) => items.push(item),
                None => tracing::warn!("Row {}: no team names found, skipping", index),
            }
        }

        tracing::debug!("Parsed {} items", items.len());
        Ok(items)
    }
}

/// Extracts one item from a game row, or None if the row has no team
fn parse_row(
    index: usize,
    row: ElementRef<'_>,
    page_date: Option<DateTime<Utc>>,
    scraped_at: DateTime<Utc>,
) -> Option<Item> {
    let teams = extract_teams(row);
    if teams.is_empty() {
        return None;
    }
    let away = teams.first().cloned();
    let home = teams.get(1).cloned();
    if home.is_none() {
        tracing::warn!("Row {}: only one team name found", index);
    }

    let league = extract_league(row);
    if league.is_none() {
        tracing::warn!("Row {}: league missing, using sentinel", index);
    }

    let event_date = EventDate::from(extract_row_date(row).or(page_date));
    if !event_date.is_known() {
        tracing::warn!("Row {}: event date missing or unparsable", index);
    }

    let period = extract_period(row).unwrap_or_else(|| DEFAULT_PERIOD.to_string());
    let away_side = away.clone().unwrap_or_else(|| "away".to_string());
    let home_side = home.clone().unwrap_or_else(|| "home".to_string());

    let is_soccer = league
        .as_deref()
        .is_some_and(|league| league.contains("SOCCER"));

    let mut builder = LineBuilder {
        index,
        period: &period,
        lines: Vec::new(),
    };

    let moneyline = column_texts(row, MONEYLINE_COLUMN);
    builder.push(Market::Moneyline, &away_side, moneyline.get(1), false);
    builder.push(Market::Moneyline, &home_side, moneyline.get(2), false);
    if is_soccer {
        let draw = moneyline.get(3).map(|text| strip_draw_label(text));
        builder.push(Market::Moneyline, "draw", draw.as_ref(), false);
    }

    let spread = column_texts(row, SPREAD_COLUMN);
    builder.push(Market::Spread, &away_side, spread.get(1), true);
    builder.push(Market::Spread, &home_side, spread.get(2), true);

    let total = column_texts(row, TOTAL_COLUMN);
    builder.push(Market::Total, "over", total.get(1), true);
    builder.push(Market::Total, "under", total.get(2), true);

    let lines = builder.lines;
    Item::new(league, event_date, away, home, lines, scraped_at)
}

/// Collects the lines of one row, logging cells that carry no price
struct LineBuilder<'a> {
    index: usize,
    period: &'a str,
    lines: Vec<Line>,
}

impl LineBuilder<'_> {
    fn push(&mut self, market: Market, side: &str, cell: Option<&String>, with_point: bool) {
        let Some(price) = cell.and_then(|text| extract_price(text)) else {
            tracing::warn!(
                "Row {}: no {} price for {}, leaving it out",
                self.index,
                market,
                side
            );
            return;
        };

        let point = if with_point {
            cell.and_then(|text| extract_point(text))
        } else {
            None
        };

        self.lines.push(Line {
            market,
            side: side.to_string(),
            price,
            point,
            period: self.period.to_string(),
        });
    }
}

fn select_all<'a>(element: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => element.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_teams(row: ElementRef<'_>) -> Vec<String> {
    select_all(row, TEAM_SELECTOR)
        .into_iter()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .collect()
}

fn extract_league(row: ElementRef<'_>) -> Option<String> {
    select_all(row, LEAGUE_SELECTOR)
        .into_iter()
        .filter_map(|link| link.value().attr("href"))
        .find_map(league_from_href)
}

/// Reads the `f` query parameter of a trends link, which may be relative
fn league_from_href(href: &str) -> Option<String> {
    let base = Url::parse("http://localhost/").ok()?;
    let url = Url::options().base_url(Some(&base)).parse(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "f")
        .map(|(_, value)| value.trim().to_uppercase())
        .filter(|value| !value.is_empty())
}

fn extract_period(row: ElementRef<'_>) -> Option<String> {
    select_all(row, PERIOD_SELECTOR)
        .into_iter()
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn extract_row_date(row: ElementRef<'_>) -> Option<DateTime<Utc>> {
    select_all(row, ROW_TIME_SELECTOR)
        .into_iter()
        .find_map(|time| time.value().attr("datetime"))
        .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Reads the slate date shown in the page's date picker, as midnight UTC
fn extract_page_date(root: ElementRef<'_>) -> Option<DateTime<Utc>> {
    let raw = select_all(root, DATEPICKER_SELECTOR)
        .into_iter()
        .find_map(|input| input.value().attr("value"))?;
    let date = NaiveDate::parse_from_str(raw.trim(), DATEPICKER_FORMAT).ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight))
}

fn column_texts(row: ElementRef<'_>, column: usize) -> Vec<String> {
    let css = format!("td:nth-child({}) span.text-muted", column);
    select_all(row, &css).into_iter().map(element_text).collect()
}

fn strip_draw_label(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("DRAW")
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([-+]?\d+)\)").expect("price pattern is valid"))
}

fn point_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("point pattern is valid"))
}

/// Extracts the odds token from a cell
///
/// `"-3.5 (-110)"` yields `-110`; a cell without parentheses yields its
/// trimmed text. Placeholders (`-`, `N/A`, empty) yield None.
pub fn extract_price(text: &str) -> Option<String> {
    if let Some(caps) = price_regex().captures(text) {
        return Some(caps[1].to_string());
    }

    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "--" || trimmed.eq_ignore_ascii_case("n/a")
    {
        return None;
    }
    Some(trimmed.to_string())
}

/// Extracts the handicap or total from a cell, e.g. `"O 8.5 (-105)"` yields 8.5
///
/// Only the part before the price in parentheses is considered.
pub fn extract_point(text: &str) -> Option<f64> {
    let head = text.split('(').next().unwrap_or_default();
    point_regex()
        .find(head)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}
