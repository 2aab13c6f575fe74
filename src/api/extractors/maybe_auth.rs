use axum::{
    extract::{FromRequestParts, FromRef},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use crate::domain::models::user::User;
use crate::api::extractors::auth::{decode_claims, user_from_claims};
use std::sync::Arc;
use tower_cookies::Cookies;
use tracing::debug;

/// Staff user when a valid access cookie is present; guests get `None`.
pub struct MaybeAuthUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let Some(cookies) = parts.extensions.get::<Cookies>() else {
            return Ok(MaybeAuthUser(None));
        };

        let access_token = match cookies.get("access_token") {
            Some(cookie) => cookie.value().to_string(),
            None => return Ok(MaybeAuthUser(None)),
        };

        match decode_claims(&access_token, &app_state.config.jwt_public_key) {
            Ok(claims) => Ok(MaybeAuthUser(Some(user_from_claims(claims)))),
            Err(status) => {
                // expired or forged tokens browse as guests
                debug!("MaybeAuth: ignoring access token ({})", status);
                Ok(MaybeAuthUser(None))
            }
        }
    }
}
