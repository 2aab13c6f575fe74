use axum::{
    extract::{State, Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, business::BusinessId, context::RequestContext};
use crate::api::dtos::{
    requests::{Pagination, ReserveVisitRequest},
    responses::{ClientSummary, CompanionResponse, PublicEventView, ReservationResponse, VisitByCodeResponse, VisitResponse},
};
use crate::api::handlers::event::paginated;
use crate::domain::models::{event::Event, visit::{Visit, VisitTransitionError}};
use crate::domain::services::{calendar::generate_visit_ics, reservation_service::ClientIdentity};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, info};

pub async fn reserve_visit(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    Path((_, slug)): Path<(String, String)>,
    Json(payload): Json<ReserveVisitRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().into_result()?;

    let event = state.event_repo.find_by_slug(&business_id, &slug).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    let identity = ClientIdentity {
        email: payload.email,
        name: payload.name,
        phone: payload.phone,
    };

    let reservation = state.reservations
        .reserve(&event, identity, payload.companions_count, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(ReservationResponse::from(reservation))))
}

pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    Path((_, slug)): Path<(String, String)>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;

    let event = state.event_repo.find_by_slug(&business_id, &slug).await?
        .ok_or(AppError::NotFound("Event not found".into()))?;

    let page = pagination.page_request();
    let visits = state.visit_repo.list_by_event(&business_id, &event.id, page).await?;
    let rows = visits.into_iter().map(VisitResponse::from).collect();
    Ok(Json(paginated(rows, &pagination, page)))
}

pub async fn confirm_visit(
    state: State<Arc<AppState>>,
    business: BusinessId,
    user: AuthUser,
    Path((_, visit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    apply_transition(state, business, user, visit_id, "confirmed", Visit::confirm).await
}

pub async fn attend_visit(
    state: State<Arc<AppState>>,
    business: BusinessId,
    user: AuthUser,
    Path((_, visit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    apply_transition(state, business, user, visit_id, "attended", Visit::mark_attended).await
}

pub async fn cancel_visit(
    state: State<Arc<AppState>>,
    business: BusinessId,
    user: AuthUser,
    Path((_, visit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    apply_transition(state, business, user, visit_id, "canceled", Visit::cancel).await
}

async fn apply_transition(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    visit_id: String,
    action: &str,
    transition: fn(&mut Visit) -> Result<(), VisitTransitionError>,
) -> Result<Json<VisitResponse>, AppError> {
    user.require_business(&business_id)?;

    let mut visit = state.visit_repo.find_by_id(&business_id, &visit_id).await?
        .ok_or(AppError::NotFound("Visit not found".into()))?;

    transition(&mut visit).map_err(|e| AppError::Conflict(e.to_string()))?;

    let updated = state.visit_repo.update_flags(&visit).await?;
    info!("Visit {} {} by {}", updated.id, action, user.0.id);
    Ok(Json(VisitResponse::from(updated)))
}

pub async fn list_companions(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
    Path((_, visit_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;

    let visit = state.visit_repo.find_by_id(&business_id, &visit_id).await?
        .ok_or(AppError::NotFound("Visit not found".into()))?;

    let companions = state.companion_repo.list_by_visit(&visit.id).await?;
    let mut rows = Vec::with_capacity(companions.len());
    for companion in companions {
        let client = state.client_repo.find_by_id(&companion.client_id).await?;
        rows.push(CompanionResponse {
            id: companion.id,
            client: client.map(ClientSummary::from),
            confirmed_at: companion.created_at,
        });
    }

    Ok(Json(rows))
}

pub async fn get_visit_by_code(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (visit, event) = load_by_code(&state, &code).await?;
    debug!("Visit {} opened by {}", visit.id, ctx.user_id.as_deref().unwrap_or("anonymous"));

    let host_name = state.client_repo.find_by_id(&visit.client_id).await?
        .map(|c| c.name)
        .unwrap_or_default();
    let companions = state.reservations.companion_status(&visit).await?;

    Ok(Json(VisitByCodeResponse {
        status: visit.status(),
        code: visit.code,
        host_name,
        companions,
        event: PublicEventView::new(&event, &ctx),
    }))
}

pub async fn download_calendar(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (visit, event) = load_by_code(&state, &code).await?;
    if visit.is_canceled {
        return Err(AppError::NotFound("Visit not found".into()));
    }

    let ics = generate_visit_ics(&event, &visit, &ctx.locale);
    let disposition = format!("attachment; filename=\"{}.ics\"", event.slug);

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ics,
    ))
}

/// Visits are addressed by code across businesses; deleted events hide
/// their visits.
pub(crate) async fn load_by_code(state: &AppState, code: &str) -> Result<(Visit, Event), AppError> {
    let visit = state.visit_repo.find_by_code(code).await?
        .ok_or(AppError::NotFound("Visit not found".into()))?;

    let event = state.event_repo.find_by_id(&visit.business_id, &visit.event_id).await?
        .filter(|e| !e.is_deleted)
        .ok_or(AppError::NotFound("Visit not found".into()))?;

    Ok((visit, event))
}
