use axum::{extract::{State, Path, Query}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, business::BusinessId, context::RequestContext, maybe_auth::MaybeAuthUser};
use crate::api::dtos::{
    requests::{CreateEventRequest, Pagination, UpdateEventRequest},
    responses::{Paginated, PublicEventView},
};
use crate::domain::models::{event::{Event, Visibility}, user::User};
use crate::domain::ports::PageRequest;
use crate::domain::services::{datetime::{to_local_fields, ScheduleInput}, subscription};
use crate::error::AppError;
use std::sync::Arc;
use sqlx::types::Json as DbJson;
use uuid::Uuid;
use chrono::Utc;
use tracing::info;

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;
    info!("Creating event: {} for business: {}", payload.slug, business_id);

    payload.validate().into_result()?;

    let business = state.business_repo.find_by_id(&business_id).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;
    if !subscription::is_active(business.plan_expires_at, Utc::now()) {
        return Err(AppError::Forbidden("An active plan is required to create events".into()));
    }

    let schedule = state.reconciler
        .reconcile_schedule(&payload.schedule, &business.default_time_zone)
        .await?;

    let event = Event {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.clone(),
        slug: payload.slug,
        texts: DbJson(payload.texts),
        location: payload.location,
        lat: payload.schedule.lat,
        lng: payload.schedule.lng,
        start_date: schedule.start,
        end_date: schedule.end,
        time_zone_id: schedule.time_zone_id,
        time_zone_name: schedule.time_zone_name,
        visits_limit: payload.visits_limit,
        visibility: payload.visibility.unwrap_or_else(|| Visibility::Public.as_str().to_string()),
        image_url: payload.image_url,
        is_deleted: false,
        created_at: Utc::now(),
    };

    let created = state.event_repo.create(&event).await?;
    info!("Event created: {} ({})", created.slug, created.id);
    Ok(Json(created))
}

pub async fn list_events(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;
    let page = pagination.page_request();
    let events = state.event_repo.list(&business_id, page).await?;
    Ok(Json(paginated(events, &pagination, page)))
}

pub async fn list_public_events(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    ctx: RequestContext,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    let page = pagination.page_request();
    let events = state.event_repo.list_public(&business_id, Utc::now(), page).await?;
    let views = events.iter().map(|e| PublicEventView::new(e, &ctx)).collect();
    Ok(Json(paginated(views, &pagination, page)))
}

/// Staff of the owning business get the stored event; everyone else gets the
/// localized public view, and private events do not exist for them.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    ctx: RequestContext,
    Path((_, slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_repo.find_by_slug(&business_id, &slug).await?
        .ok_or_else(|| AppError::NotFound(format!("Event '{}' not found", slug)))?;

    if is_staff(maybe_user.as_ref(), &business_id) {
        return serde_json::to_value(&event)
            .map(Json)
            .map_err(|e| AppError::InternalWithMsg(e.to_string()));
    }

    if event.visibility() == Visibility::Private {
        return Err(AppError::NotFound(format!("Event '{}' not found", slug)));
    }

    serde_json::to_value(PublicEventView::new(&event, &ctx))
        .map(Json)
        .map_err(|e| AppError::InternalWithMsg(e.to_string()))
}

pub async fn update_event(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    Path((_, slug)): Path<(String, String)>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;
    payload.validate().into_result()?;

    let mut event = state.event_repo.find_by_slug(&business_id, &slug).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    if payload.touches_schedule() {
        let business = state.business_repo.find_by_id(&business_id).await?
            .ok_or(AppError::NotFound("Business not found".into()))?;
        let input = merged_schedule(&event, &payload);
        let schedule = state.reconciler.reconcile_schedule(&input, &business.default_time_zone).await?;

        event.lat = input.lat;
        event.lng = input.lng;
        event.start_date = schedule.start;
        event.end_date = schedule.end;
        event.time_zone_id = schedule.time_zone_id;
        event.time_zone_name = schedule.time_zone_name;
    }

    if let Some(val) = payload.slug { event.slug = val; }
    if let Some(val) = payload.texts { event.texts = DbJson(val); }
    if let Some(val) = payload.location { event.location = Some(val); }
    if let Some(val) = payload.visits_limit { event.visits_limit = val; }
    if let Some(val) = payload.visibility { event.visibility = val; }
    if let Some(val) = payload.image_url { event.image_url = Some(val); }

    let updated = state.event_repo.update(&event).await?;
    info!("Event updated: {}", slug);
    Ok(Json(updated))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    Path((_, slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;

    let event = state.event_repo.find_by_slug(&business_id, &slug).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    state.event_repo.soft_delete(&business_id, &event.id).await?;
    info!("Event deleted: {}", slug);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn get_capacity(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    Path((_, slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.event_repo.find_by_slug(&business_id, &slug).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    if event.visibility() == Visibility::Private && !is_staff(maybe_user.as_ref(), &business_id) {
        return Err(AppError::NotFound("Event not found".into()));
    }

    Ok(Json(state.reservations.capacity_summary(&event).await?))
}

pub(crate) fn is_staff(user: Option<&User>, business_id: &str) -> bool {
    user.is_some_and(|u| u.business_id == business_id)
}

pub(crate) fn paginated<T: serde::Serialize>(items: Vec<T>, pagination: &Pagination, page: PageRequest) -> Paginated<T> {
    Paginated {
        items,
        page: pagination.page.unwrap_or(1).max(1),
        per_page: page.limit as u32,
    }
}

/// Current schedule in the event's own zone, overridden by whatever the
/// update carries. An explicit zone without a coordinate drops the stored
/// coordinate so the new zone wins.
fn merged_schedule(event: &Event, payload: &UpdateEventRequest) -> ScheduleInput {
    let (start_date, start_time) = to_local_fields(event.start_date, &event.time_zone_id);
    let (end_date, end_time) = to_local_fields(event.end_date, &event.time_zone_id);

    let explicit_zone = payload.time_zone_id.is_some() && payload.lat.is_none() && payload.lng.is_none();
    let (lat, lng) = if explicit_zone {
        (None, None)
    } else {
        (payload.lat.or(event.lat), payload.lng.or(event.lng))
    };

    ScheduleInput {
        start_date: payload.start_date.clone().unwrap_or(start_date),
        start_time: payload.start_time.clone().unwrap_or(start_time),
        end_date: payload.end_date.clone().unwrap_or(end_date),
        end_time: payload.end_time.clone().unwrap_or(end_time),
        lat,
        lng,
        time_zone_id: payload.time_zone_id.clone().or_else(|| Some(event.time_zone_id.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::event::LocalizedTexts;
    use chrono::TimeZone;

    fn madrid_event() -> Event {
        Event {
            id: "e1".into(),
            business_id: "b1".into(),
            slug: "tour".into(),
            texts: DbJson(LocalizedTexts::new()),
            location: None,
            lat: Some(40.4),
            lng: Some(-3.7),
            start_date: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            time_zone_id: "Europe/Madrid".into(),
            time_zone_name: "Central European Summer Time".into(),
            visits_limit: 10,
            visibility: "PUBLIC".into(),
            image_url: None,
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn merged_schedule_keeps_untouched_fields_in_event_zone() {
        let payload = UpdateEventRequest { end_time: Some("13:00".into()), ..Default::default() };
        let input = merged_schedule(&madrid_event(), &payload);
        assert_eq!(input.start_date, "2025-06-01");
        assert_eq!(input.start_time, "10:00");
        assert_eq!(input.end_time, "13:00");
        assert_eq!(input.lat, Some(40.4));
    }

    #[test]
    fn explicit_zone_replaces_stored_coordinate() {
        let payload = UpdateEventRequest { time_zone_id: Some("America/New_York".into()), ..Default::default() };
        let input = merged_schedule(&madrid_event(), &payload);
        assert_eq!(input.lat, None);
        assert_eq!(input.time_zone_id.as_deref(), Some("America/New_York"));
    }
}
