use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// League sentinel used when a row does not name its competition
pub const UNKNOWN_LEAGUE: &str = "UNKNOWN";

const UNKNOWN_DATE: &str = "unknown";

/// Scheduled start of an event
///
/// Serialized as an RFC 3339 string, or the literal `"unknown"` when the page
/// did not expose a usable date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDate {
    Known(DateTime<Utc>),
    Unknown,
}

impl EventDate {
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<Option<DateTime<Utc>>> for EventDate {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Unknown, Self::Known)
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
            Self::Unknown => write!(f, "{}", UNKNOWN_DATE),
        }
    }
}

impl Serialize for EventDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == UNKNOWN_DATE {
            return Ok(Self::Unknown);
        }
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Self::Known(dt.with_timezone(&Utc)))
            .map_err(de::Error::custom)
    }
}

/// Betting market a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    Moneyline,
    Spread,
    Total,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moneyline => "moneyline",
            Self::Spread => "spread",
            Self::Total => "total",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One priced outcome within a market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Market label
    pub market: Market,

    /// What the bet is on: a team name, `draw`, `over` or `under`
    pub side: String,

    /// American odds token as shown on the page (`-110`, `+145`, `EVEN`)
    pub price: String,

    /// Handicap or total points, when the market carries one
    pub point: Option<f64>,

    /// Game period the price applies to
    pub period: String,
}

/// One normalized game row
///
/// Invariants: `league` is never empty, at least one of `home_team` and
/// `away_team` is non-empty, and `lines` is present even when empty. Fields
/// are only reachable through [`Item::new`] and deserialization, which both
/// enforce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct Item {
    league: String,
    event_date: EventDate,
    home_team: String,
    away_team: String,
    lines: Vec<Line>,
    scraped_at: DateTime<Utc>,
}

/// Wire shape of an [`Item`] before its invariants are checked
#[derive(Deserialize)]
struct ItemRecord {
    league: String,
    event_date: EventDate,
    home_team: String,
    away_team: String,
    lines: Vec<Line>,
    scraped_at: DateTime<Utc>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = String;

    fn try_from(record: ItemRecord) -> Result<Self, Self::Error> {
        Item::new(
            Some(record.league),
            record.event_date,
            Some(record.away_team),
            Some(record.home_team),
            record.lines,
            record.scraped_at,
        )
        .ok_or_else(|| "item has neither away_team nor home_team".to_string())
    }
}

impl Item {
    /// Builds an item, returning None if the identifying fields cannot satisfy
    /// the invariants
    ///
    /// An empty league is replaced by [`UNKNOWN_LEAGUE`]; a row with neither
    /// team name is rejected.
    pub fn new(
        league: Option<String>,
        event_date: EventDate,
        away_team: Option<String>,
        home_team: Option<String>,
        lines: Vec<Line>,
        scraped_at: DateTime<Utc>,
    ) -> Option<Self> {
        let away_team = away_team.unwrap_or_default();
        let home_team = home_team.unwrap_or_default();
        if away_team.is_empty() && home_team.is_empty() {
            return None;
        }

        let league = league
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LEAGUE.to_string());

        Some(Self {
            league,
            event_date,
            home_team,
            away_team,
            lines,
            scraped_at,
        })
    }

    /// League code, or [`UNKNOWN_LEAGUE`]
    pub fn league(&self) -> &str {
        &self.league
    }

    pub fn event_date(&self) -> EventDate {
        self.event_date
    }

    /// Second listed team; may be empty when only one team was found
    pub fn home_team(&self) -> &str {
        &self.home_team
    }

    /// First listed team; may be empty when only one team was found
    pub fn away_team(&self) -> &str {
        &self.away_team
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// When the page holding this row was parsed
    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    /// Returns true if the league came from the page rather than the sentinel
    pub fn has_known_league(&self) -> bool {
        self.league != UNKNOWN_LEAGUE
    }
}
