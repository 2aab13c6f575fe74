use crate::domain::models::{event::Event, visit::Visit};
use icalendar::{Calendar, Component, Event as IcalEvent, EventLike};

/// Generates an iCalendar (.ics) string for a visit, titled in `locale`.
pub fn generate_visit_ics(event: &Event, visit: &Visit, locale: &str) -> String {
    let mut calendar = Calendar::new();

    let (title, description) = event.text_for(locale)
        .map(|t| (t.title.clone(), t.description.clone()))
        .unwrap_or_else(|| (event.slug.clone(), String::new()));

    let mut ical_event = IcalEvent::new();
    ical_event
        .summary(&title)
        .description(&description)
        .starts(event.start_date)
        .ends(event.end_date)
        .uid(&visit.id);
    if let Some(location) = &event.location {
        ical_event.location(location);
    }

    calendar.push(ical_event.done());
    calendar.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::event::{EventText, LocalizedTexts};
    use crate::domain::models::visit::NewVisitParams;
    use chrono::{TimeZone, Utc};
    use sqlx::types::Json;

    #[test]
    fn ics_contains_localized_title_and_utc_times() {
        let mut texts = LocalizedTexts::new();
        texts.insert("es".into(), EventText { title: "Cata de vinos".into(), description: "Bodega".into() });
        let event = Event {
            id: "e1".into(),
            business_id: "b1".into(),
            slug: "wine".into(),
            texts: Json(texts),
            location: Some("Rioja".into()),
            lat: None,
            lng: None,
            start_date: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            time_zone_id: "Europe/Madrid".into(),
            time_zone_name: "CEST".into(),
            visits_limit: 10,
            visibility: "PUBLIC".into(),
            image_url: None,
            is_deleted: false,
            created_at: Utc::now(),
        };
        let visit = Visit::new(NewVisitParams {
            business_id: "b1".into(),
            event_id: "e1".into(),
            client_id: "c1".into(),
            companions_count: 1,
        });

        let ics = generate_visit_ics(&event, &visit, "es");
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(ics.contains("SUMMARY:Cata de vinos"));
        assert!(ics.contains("DTSTART:20250601T080000Z"));
        assert!(ics.contains(&format!("UID:{}", visit.id)));
    }
}
