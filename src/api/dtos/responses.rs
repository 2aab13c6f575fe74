use crate::api::extractors::context::RequestContext;
use crate::domain::models::{
    client::ClientProfile,
    companion::ClientCompanion,
    event::{Event, Visibility},
    visit::{Visit, VisitStatus},
};
use crate::domain::services::{
    datetime::to_local_rfc3339,
    reservation_service::{CompanionStatus, Reservation},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct BusinessCreatedResponse {
    pub business_id: String,
    pub admin_username: String,
    pub admin_secret: String,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
}

/// Event as shown to clients: one language, times in the event's zone and,
/// when the caller sent one, in their own.
#[derive(Serialize)]
pub struct PublicEventView {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub local_start: String,
    pub local_end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_end: Option<String>,
    pub time_zone_id: String,
    pub time_zone_name: String,
    pub visibility: Visibility,
    pub image_url: Option<String>,
}

impl PublicEventView {
    pub fn new(event: &Event, ctx: &RequestContext) -> Self {
        let (title, description) = event.text_for(&ctx.locale)
            .map(|t| (t.title.clone(), t.description.clone()))
            .unwrap_or_default();

        Self {
            id: event.id.clone(),
            slug: event.slug.clone(),
            title,
            description,
            location: event.location.clone(),
            lat: event.lat,
            lng: event.lng,
            start_date: event.start_date,
            end_date: event.end_date,
            local_start: to_local_rfc3339(event.start_date, &event.time_zone_id),
            local_end: to_local_rfc3339(event.end_date, &event.time_zone_id),
            viewer_start: ctx.time_zone.map(|tz| event.start_date.with_timezone(&tz).to_rfc3339()),
            viewer_end: ctx.time_zone.map(|tz| event.end_date.with_timezone(&tz).to_rfc3339()),
            time_zone_id: event.time_zone_id.clone(),
            time_zone_name: event.time_zone_name.clone(),
            visibility: event.visibility(),
            image_url: event.image_url.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub visit_id: String,
    pub code: String,
    pub status: VisitStatus,
    pub companions_count: i32,
    pub invite_url: String,
    pub client: ClientSummary,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            status: r.visit.status(),
            visit_id: r.visit.id,
            code: r.visit.code,
            companions_count: r.visit.companions_count,
            invite_url: r.invite_url,
            client: r.client.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ClientSummary {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<ClientProfile> for ClientSummary {
    fn from(c: ClientProfile) -> Self {
        Self { id: c.id, email: c.email, name: c.name }
    }
}

/// Staff listing row.
#[derive(Serialize)]
pub struct VisitResponse {
    #[serde(flatten)]
    pub visit: Visit,
    pub status: VisitStatus,
}

impl From<Visit> for VisitResponse {
    fn from(visit: Visit) -> Self {
        Self { status: visit.status(), visit }
    }
}

/// What a companion sees when opening an invite link.
#[derive(Serialize)]
pub struct VisitByCodeResponse {
    pub code: String,
    pub status: VisitStatus,
    pub host_name: String,
    pub companions: CompanionStatus,
    pub event: PublicEventView,
}

#[derive(Serialize)]
pub struct CompanionConfirmationResponse {
    pub status: &'static str,
    pub companion: ClientCompanion,
    pub companions: CompanionStatus,
}

#[derive(Serialize)]
pub struct CompanionResponse {
    pub id: String,
    pub client: Option<ClientSummary>,
    pub confirmed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::event::{EventText, LocalizedTexts};
    use chrono::TimeZone;
    use sqlx::types::Json;

    fn madrid_event() -> Event {
        let mut texts = LocalizedTexts::new();
        texts.insert("en".into(), EventText { title: "Night walk".into(), description: String::new() });
        texts.insert("es".into(), EventText { title: "Paseo nocturno".into(), description: String::new() });
        Event {
            id: "e1".into(),
            business_id: "b1".into(),
            slug: "night-walk".into(),
            texts: Json(texts),
            location: None,
            lat: Some(40.4),
            lng: Some(-3.7),
            start_date: Utc.with_ymd_and_hms(2025, 7, 1, 18, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 7, 1, 20, 0, 0).unwrap(),
            time_zone_id: "Europe/Madrid".into(),
            time_zone_name: "Central European Summer Time".into(),
            visits_limit: 0,
            visibility: "UNLISTED".into(),
            image_url: None,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn public_view_renders_event_and_viewer_zones() {
        let ctx = RequestContext {
            user_id: None,
            locale: "es".into(),
            time_zone: Some(chrono_tz::America::New_York),
        };
        let view = PublicEventView::new(&madrid_event(), &ctx);

        assert_eq!(view.title, "Paseo nocturno");
        assert_eq!(view.local_start, "2025-07-01T20:00:00+02:00");
        assert_eq!(view.viewer_start.as_deref(), Some("2025-07-01T14:00:00-04:00"));
        assert_eq!(view.viewer_end.as_deref(), Some("2025-07-01T16:00:00-04:00"));
        assert_eq!(view.visibility, Visibility::Unlisted);
    }

    #[test]
    fn public_view_without_viewer_zone_omits_viewer_times() {
        let ctx = RequestContext { user_id: None, locale: "fr".into(), time_zone: None };
        let view = PublicEventView::new(&madrid_event(), &ctx);

        assert_eq!(view.title, "Night walk");
        assert!(view.viewer_start.is_none());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("viewer_start").is_none());
    }
}
