use axum::{extract::{State, Path}, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::extractors::{auth::AuthUser, business::BusinessId};
use crate::api::dtos::{requests::CreateMemberRequest, responses::MemberResponse};
use crate::domain::models::user::{User, ROLE_ADMIN, ROLE_MEMBER};
use std::sync::Arc;
use crate::error::{AppError, FieldErrors};
use argon2::{password_hash::{SaltString, PasswordHasher}, Argon2};
use rand::rngs::OsRng;
use tracing::{info, error};

fn to_response(user: User) -> MemberResponse {
    MemberResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        created_at: user.created_at,
    }
}

pub async fn create_member(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    admin: AuthUser,
    Json(payload): Json<CreateMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin(&business_id)?;

    let role = match payload.role.as_deref() {
        None | Some(ROLE_MEMBER) => ROLE_MEMBER,
        Some(ROLE_ADMIN) => ROLE_ADMIN,
        Some(other) => return Err(AppError::Fields(FieldErrors::single("role", format!("Unknown role '{}'", other)))),
    };
    if payload.password.len() < 8 {
        return Err(AppError::Fields(FieldErrors::single("password", "Password must have at least 8 characters")));
    }

    if state.user_repo.find_by_username(&business_id, &payload.username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal)?
        .to_string();

    let user = User::new(business_id, payload.username, password_hash, role);
    let created = state.user_repo.create(&user).await?;

    info!("Created member user: {}", created.id);
    Ok(Json(to_response(created)))
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_business(&business_id)?;

    let members = state.user_repo.list_by_business(&business_id).await?;
    Ok(Json(members.into_iter().map(to_response).collect::<Vec<_>>()))
}

pub async fn delete_member(
    State(state): State<Arc<AppState>>,
    BusinessId(business_id): BusinessId,
    admin: AuthUser,
    Path((_, user_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    admin.require_admin(&business_id)?;
    if admin.0.id == user_id {
        return Err(AppError::Conflict("Cannot delete yourself".into()));
    }

    match state.user_repo.delete(&business_id, &user_id).await {
        Ok(_) => {
            info!("Deleted user {}", user_id);
            Ok(Json(serde_json::json!({"status": "deleted"})))
        },
        Err(e) => {
            error!("Failed to delete user {}: {:?}", user_id, e);
            Err(e)
        }
    }
}
