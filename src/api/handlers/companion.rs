use axum::{extract::{State, Path}, http::StatusCode, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{requests::ConfirmCompanionRequest, responses::CompanionConfirmationResponse};
use crate::api::handlers::visit::load_by_code;
use crate::domain::services::reservation_service::{ClientIdentity, CompanionConfirmation};
use crate::error::AppError;
use std::sync::Arc;
use chrono::Utc;

/// Confirms the caller as a companion of the visit behind `code`. A repeat
/// confirmation answers 200 with the existing row instead of 201.
pub async fn confirm_companion(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(payload): Json<ConfirmCompanionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().into_result()?;

    let (visit, event) = load_by_code(&state, &code).await?;
    if event.has_finished(Utc::now()) {
        return Err(AppError::Validation("This event has already finished".into()));
    }

    let identity = ClientIdentity {
        email: payload.email,
        name: payload.name,
        phone: payload.phone,
    };

    let (status_code, status, companion) = match state.reservations.confirm_companion(&visit, identity).await? {
        CompanionConfirmation::Confirmed(c) => (StatusCode::CREATED, "CONFIRMED", c),
        CompanionConfirmation::AlreadyConfirmed(c) => (StatusCode::OK, "ALREADY_CONFIRMED", c),
    };
    let companions = state.reservations.companion_status(&visit).await?;

    Ok((status_code, Json(CompanionConfirmationResponse { status, companion, companions })))
}
