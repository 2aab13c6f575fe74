use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::{
    requests::{CreateBusinessRequest, ExtendSubscriptionRequest, UpdateBusinessRequest},
    responses::BusinessCreatedResponse,
};
use crate::api::extractors::{auth::AuthUser, business::BusinessId};
use crate::domain::models::{business::Business, user::{User, ROLE_ADMIN}};
use crate::domain::services::subscription::{self, MAX_EXTENSION_MONTHS};
use crate::error::{AppError, FieldErrors};
use std::sync::Arc;
use chrono::Utc;
use chrono_tz::Tz;
use rand::{distributions::Alphanumeric, Rng};
use argon2::{password_hash::SaltString, Argon2, PasswordHasher};
use tracing::info;

pub async fn create_business(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = FieldErrors::new();
    if payload.name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
    if payload.slug.is_empty() || !payload.slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        errors.add("slug", "Slug may only contain lowercase letters, digits and dashes");
    }
    let default_time_zone = payload.default_time_zone
        .unwrap_or_else(|| state.config.default_time_zone.clone());
    if default_time_zone.parse::<Tz>().is_err() {
        errors.add("default_time_zone", format!("Unknown timezone '{}'", default_time_zone));
    }
    errors.into_result()?;

    let mut business = Business::new(payload.name, payload.slug, default_time_zone);
    business.logo_url = payload.logo_url;

    let created = state.business_repo.create(&business).await?;
    info!("Business created: {}", created.id);

    let admin_password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(admin_password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string();

    let admin_user = User::new(created.id.clone(), "admin".to_string(), password_hash, ROLE_ADMIN);
    state.user_repo.create(&admin_user).await?;

    Ok(Json(BusinessCreatedResponse {
        business_id: created.id,
        admin_username: "admin".to_string(),
        admin_secret: admin_password,
    }))
}

pub async fn get_business_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let business = state.business_repo.find_by_slug(&slug).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;

    Ok(Json(business))
}

pub async fn update_business(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateBusinessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let business_id = user.0.business_id.clone();
    user.require_admin(&business_id)?;

    let mut business = state.business_repo.find_by_id(&business_id).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;

    if let Some(name) = payload.name {
        business.name = name;
    }
    if let Some(logo) = payload.logo_url {
        business.logo_url = Some(logo);
    }
    if let Some(zone) = payload.default_time_zone {
        if zone.parse::<Tz>().is_err() {
            return Err(AppError::Fields(FieldErrors::single("default_time_zone", format!("Unknown timezone '{}'", zone))));
        }
        business.default_time_zone = zone;
    }

    let updated = state.business_repo.update(&business).await?;
    info!("Business updated: {}", business_id);
    Ok(Json(updated))
}

pub async fn get_current_business(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let business = state.business_repo.find_by_id(&user.0.business_id).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;
    Ok(Json(business))
}

pub async fn extend_subscription(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    admin: AuthUser,
    Json(payload): Json<ExtendSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin(&business_id)?;

    if payload.months == 0 || payload.months > MAX_EXTENSION_MONTHS {
        return Err(AppError::Fields(FieldErrors::single(
            "months",
            format!("Months must be between 1 and {}", MAX_EXTENSION_MONTHS),
        )));
    }

    let mut business = state.business_repo.find_by_id(&business_id).await?
        .ok_or(AppError::NotFound("Business not found".into()))?;

    business.plan_expires_at = Some(
        subscription::extend_expiration(business.plan_expires_at, Utc::now(), payload.months)
            .ok_or_else(|| AppError::Validation("Expiration date out of range".into()))?,
    );

    let updated = state.business_repo.update(&business).await?;
    info!("Subscription for {} extended to {:?}", business_id, updated.plan_expires_at);
    Ok(Json(updated))
}
