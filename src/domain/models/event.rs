use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use sqlx::types::Json;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::domain::services::capacity::Capacity;

pub const FALLBACK_LOCALE: &str = "en";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EventText {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Event text keyed by locale (`en`, `es`, ...).
pub type LocalizedTexts = BTreeMap<String, EventText>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Listed on the business page and bookable.
    Public,
    /// Bookable through its slug, never listed.
    Unlisted,
    /// Staff only.
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Unlisted => "UNLISTED",
            Visibility::Private => "PRIVATE",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUBLIC" => Ok(Visibility::Public),
            "UNLISTED" => Ok(Visibility::Unlisted),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(format!("Unknown visibility '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: String,
    pub business_id: String,
    pub slug: String,
    pub texts: Json<LocalizedTexts>,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub time_zone_id: String,
    pub time_zone_name: String,
    pub visits_limit: i32,
    pub visibility: String,
    pub image_url: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn capacity(&self) -> Capacity {
        Capacity::from_visits_limit(self.visits_limit)
    }

    /// Unknown stored values are treated as private.
    pub fn visibility(&self) -> Visibility {
        self.visibility.parse().unwrap_or(Visibility::Private)
    }

    pub fn has_finished(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }

    /// Picks the text for `locale`, then the fallback locale, then whatever
    /// comes first.
    pub fn text_for(&self, locale: &str) -> Option<&EventText> {
        self.texts.0.get(locale)
            .or_else(|| self.texts.0.get(FALLBACK_LOCALE))
            .or_else(|| self.texts.0.values().next())
    }
}
