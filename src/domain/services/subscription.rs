use chrono::{DateTime, Months, Utc};

pub const MAX_EXTENSION_MONTHS: u32 = 36;

/// New expiry after buying `months`: unused time on an active plan is kept,
/// an expired or missing plan restarts from `now`.
pub fn extend_expiration(current: Option<DateTime<Utc>>, now: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let base = match current {
        Some(expires_at) if expires_at > now => expires_at,
        _ => now,
    };
    base.checked_add_months(Months::new(months))
}

pub fn is_active(plan_expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    plan_expires_at.is_some_and(|expires_at| expires_at > now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn extends_from_now_when_expired_or_missing() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let expired = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(extend_expiration(None, now, 1), Some(Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()));
        assert_eq!(extend_expiration(Some(expired), now, 12), Some(Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()));
    }

    #[test]
    fn keeps_remaining_time_on_active_plan() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let active = Utc.with_ymd_and_hms(2025, 5, 31, 0, 0, 0).unwrap();

        // month arithmetic clamps to the last day of shorter months
        assert_eq!(extend_expiration(Some(active), now, 1), Some(Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap()));
    }

    #[test]
    fn activity_is_strictly_before_expiry() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert!(!is_active(None, now));
        assert!(!is_active(Some(now), now));
        assert!(is_active(Some(now + chrono::Duration::seconds(1)), now));
    }
}
