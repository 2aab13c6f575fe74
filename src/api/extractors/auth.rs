use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::auth::{Claims, TOKEN_AUDIENCE};
use crate::domain::models::user::User;
use crate::error::AppError;
use std::sync::Arc;
use tower_cookies::Cookies;
use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use tracing::{Span, warn};

pub struct AuthUser(pub User);

impl AuthUser {
    /// Staff may only act inside their own business.
    pub fn require_business(&self, business_id: &str) -> Result<(), AppError> {
        if self.0.business_id != business_id {
            warn!("User {} attempted access to business {}", self.0.id, business_id);
            return Err(AppError::Forbidden("You do not belong to this business".into()));
        }
        Ok(())
    }

    pub fn require_admin(&self, business_id: &str) -> Result<(), AppError> {
        self.require_business(business_id)?;
        if !self.0.is_admin() {
            return Err(AppError::Forbidden("Admin role required".into()));
        }
        Ok(())
    }
}

pub(crate) fn decode_claims(token: &str, public_key_pem: &str) -> Result<Claims, StatusCode> {
    let decoding_key = DecodingKey::from_ed_pem(public_key_pem.as_bytes())
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

pub(crate) fn user_from_claims(claims: Claims) -> User {
    User {
        id: claims.sub,
        business_id: claims.business_id,
        username: "from_jwt".to_string(),
        role: claims.role,
        password_hash: String::new(),
        created_at: chrono::Utc::now(),
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts.extensions.get::<Cookies>()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        let access_token = cookies.get("access_token")
            .ok_or(StatusCode::UNAUTHORIZED)?
            .value()
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);
        let claims = decode_claims(&access_token, &app_state.config.jwt_public_key)?;

        let method = &parts.method;
        if method != "GET" && method != "HEAD" && method != "OPTIONS" {
            let csrf_header_val = parts.headers.get("X-CSRF-Token")
                .ok_or(StatusCode::FORBIDDEN)?
                .to_str()
                .map_err(|_| StatusCode::FORBIDDEN)?;

            if csrf_header_val != claims.csrf_token {
                return Err(StatusCode::FORBIDDEN);
            }
        }

        let user = user_from_claims(claims);

        Span::current().record("business_id", &user.business_id);
        Span::current().record("user_id", &user.id);

        Ok(AuthUser(user))
    }
}
