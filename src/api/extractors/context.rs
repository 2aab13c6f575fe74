use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::api::extractors::maybe_auth::MaybeAuthUser;
use crate::domain::models::event::FALLBACK_LOCALE;
use crate::state::AppState;

pub const TIME_ZONE_HEADER: &str = "X-Time-Zone";

/// Per-request ambient values: who is calling, which language they read and
/// which zone they want times displayed in.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Option<String>,
    pub locale: String,
    pub time_zone: Option<Tz>,
}

impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(parts, state).await?;

        let locale = parts.headers.get(header::ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .and_then(primary_language)
            .unwrap_or_else(|| FALLBACK_LOCALE.to_string());

        // unknown zones are ignored rather than rejected
        let time_zone = parts.headers.get(TIME_ZONE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<Tz>().ok());

        Ok(RequestContext {
            user_id: user.map(|u| u.id),
            locale,
            time_zone,
        })
    }
}

/// `es-ES,es;q=0.9,en;q=0.8` -> `es`
pub fn primary_language(accept_language: &str) -> Option<String> {
    accept_language
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .find(|tag| !tag.is_empty() && *tag != "*")
        .and_then(|tag| tag.split(['-', '_']).next())
        .map(str::to_ascii_lowercase)
}
