use axum::{
    extract::{FromRequestParts, Path},
    http::{request::Parts, StatusCode},
};
use std::collections::HashMap;
use crate::state::AppState;
use std::sync::Arc;
use tracing::error;

/// `business_id` path segment, verified to name an existing business.
pub struct BusinessId(pub String);

impl FromRequestParts<Arc<AppState>> for BusinessId {
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        let business_id = params.get("business_id").ok_or(StatusCode::BAD_REQUEST)?;

        match state.business_repo.find_by_id(business_id).await {
            Ok(Some(_)) => Ok(BusinessId(business_id.clone())),
            Ok(None) => Err(StatusCode::NOT_FOUND),
            Err(e) => {
                error!("Business lookup failed: {:?}", e);
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
