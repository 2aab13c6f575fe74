//! Turns form-entered local dates and times into stored UTC instants.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono::offset::LocalResult;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::ports::TimezoneLookup;
use crate::error::{AppError, FieldErrors, TimezoneLookupError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    pub time_zone_id: String,
    pub time_zone_name: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocalTimeError {
    #[error("Unknown timezone '{0}'")]
    UnknownZone(String),
    #[error("{0} does not exist in {1} (skipped by a daylight-saving change)")]
    Nonexistent(NaiveDateTime, String),
}

/// Raw schedule fields as submitted by the event form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScheduleInput {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Used when no coordinate is given.
    pub time_zone_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledSchedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone_id: String,
    pub time_zone_name: String,
}

pub struct DateTimeReconciler {
    lookup: Arc<dyn TimezoneLookup>,
    timeout: Duration,
}

impl DateTimeReconciler {
    pub fn new(lookup: Arc<dyn TimezoneLookup>, timeout: Duration) -> Self {
        Self { lookup, timeout }
    }

    /// Single attempt, bounded by the configured timeout.
    pub async fn resolve_timezone(&self, lat: f64, lng: f64, at: DateTime<Utc>) -> Result<TimezoneInfo, TimezoneLookupError> {
        let info = match tokio::time::timeout(self.timeout, self.lookup.lookup(lat, lng, at)).await {
            Ok(result) => result?,
            Err(_) => return Err(TimezoneLookupError::Timeout(self.timeout)),
        };

        if info.time_zone_id.parse::<Tz>().is_err() {
            return Err(TimezoneLookupError::NoResult(format!("unrecognized zone '{}'", info.time_zone_id)));
        }

        debug!("Resolved ({}, {}) to {}", lat, lng, info.time_zone_id);
        Ok(info)
    }

    /// Validates the raw fields, resolves the display timezone and converts
    /// both ends to UTC. Ordering is checked on the local pairs and again on
    /// the converted instants.
    pub async fn reconcile_schedule(&self, input: &ScheduleInput, fallback_time_zone: &str) -> Result<ReconciledSchedule, AppError> {
        let mut errors = FieldErrors::new();
        let local_start = parse_local_field(&input.start_date, &input.start_time, "start_date", "start_time", &mut errors);
        let local_end = parse_local_field(&input.end_date, &input.end_time, "end_date", "end_time", &mut errors);
        validate_coordinate(input.lat, input.lng, &mut errors);
        errors.into_result()?;

        let (Some(local_start), Some(local_end)) = (local_start, local_end) else {
            return Err(AppError::Internal);
        };
        validate_ordering(&local_start, &local_end)?;

        let zone = match (input.lat, input.lng) {
            (Some(lat), Some(lng)) => {
                self.resolve_timezone(lat, lng, local_start.and_utc()).await?
            }
            _ => {
                let id = input.time_zone_id.as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(fallback_time_zone);
                if id.parse::<Tz>().is_err() {
                    return Err(AppError::Fields(FieldErrors::single("time_zone_id", format!("Unknown timezone '{}'", id))));
                }
                TimezoneInfo { time_zone_id: id.to_string(), time_zone_name: id.to_string() }
            }
        };

        let start = to_utc_instant(local_start, &zone.time_zone_id)
            .map_err(|e| AppError::Fields(FieldErrors::single("start_time", e.to_string())))?;
        let end = to_utc_instant(local_end, &zone.time_zone_id)
            .map_err(|e| AppError::Fields(FieldErrors::single("end_time", e.to_string())))?;
        validate_ordering(&start, &end)?;

        info!("Reconciled schedule {} -> {} in {}", start, end, zone.time_zone_id);
        Ok(ReconciledSchedule {
            start,
            end,
            time_zone_id: zone.time_zone_id,
            time_zone_name: zone.time_zone_name,
        })
    }
}

/// `YYYY-MM-DD` + `HH:MM` into a naive local datetime; problems are recorded
/// under the given field names.
fn parse_local_field(date: &str, time: &str, date_field: &str, time_field: &str, errors: &mut FieldErrors) -> Option<NaiveDateTime> {
    let date = match date.trim() {
        "" => { errors.add(date_field, "Required"); None }
        s => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| errors.add(date_field, "Invalid date (YYYY-MM-DD)"))
            .ok(),
    };
    let time = match time.trim() {
        "" => { errors.add(time_field, "Required"); None }
        s => NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| errors.add(time_field, "Invalid time (HH:MM)"))
            .ok(),
    };
    Some(date?.and_time(time?))
}

fn validate_coordinate(lat: Option<f64>, lng: Option<f64>, errors: &mut FieldErrors) {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            if !(-90.0..=90.0).contains(&lat) {
                errors.add("lat", "Latitude must be between -90 and 90");
            }
            if !(-180.0..=180.0).contains(&lng) {
                errors.add("lng", "Longitude must be between -180 and 180");
            }
        }
        (Some(_), None) => errors.add("lng", "Required when lat is set"),
        (None, Some(_)) => errors.add("lat", "Required when lng is set"),
        (None, None) => {}
    }
}

/// Interprets `local` as wall-clock time in `time_zone_id`. Ambiguous times
/// (clocks falling back) take the earlier instant; skipped times are rejected.
pub fn to_utc_instant(local: NaiveDateTime, time_zone_id: &str) -> Result<DateTime<Utc>, LocalTimeError> {
    let tz: Tz = time_zone_id.parse()
        .map_err(|_| LocalTimeError::UnknownZone(time_zone_id.to_string()))?;

    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(LocalTimeError::Nonexistent(local, time_zone_id.to_string())),
    }
}

pub fn validate_ordering<T: PartialOrd>(start: &T, end: &T) -> Result<(), AppError> {
    if start >= end {
        return Err(AppError::InvalidDateRange("End must be after start".into()));
    }
    Ok(())
}

/// RFC 3339 rendering of `instant` in the given zone, UTC when unknown.
pub fn to_local_rfc3339(instant: DateTime<Utc>, time_zone_id: &str) -> String {
    let tz: Tz = time_zone_id.parse().unwrap_or(chrono_tz::UTC);
    instant.with_timezone(&tz).to_rfc3339()
}

/// Inverse of `parse_local_field`: the `YYYY-MM-DD` and `HH:MM` strings a form
/// would submit for `instant` in the given zone.
pub fn to_local_fields(instant: DateTime<Utc>, time_zone_id: &str) -> (String, String) {
    let tz: Tz = time_zone_id.parse().unwrap_or(chrono_tz::UTC);
    let local = instant.with_timezone(&tz);
    (local.format("%Y-%m-%d").to_string(), local.format("%H:%M").to_string())
}
