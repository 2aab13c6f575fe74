use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, delete},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{auth, business, companion, event, health, member, visit};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tower_cookies::CookieManagerLayer;
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))

        // Business
        .route("/api/v1/businesses/by-slug/{slug}", get(business::get_business_by_slug))
        .route("/api/v1/businesses", post(business::create_business).put(business::update_business).get(business::get_current_business))
        .route("/api/v1/{business_id}/subscription/extend", post(business::extend_subscription))
        .route("/api/v1/{business_id}/members", post(member::create_member).get(member::list_members))
        .route("/api/v1/{business_id}/members/{user_id}", delete(member::delete_member))

        // Events
        .route("/api/v1/{business_id}/events", post(event::create_event).get(event::list_events))
        .route("/api/v1/{business_id}/public/events", get(event::list_public_events))
        .route("/api/v1/{business_id}/events/{slug}", get(event::get_event).put(event::update_event).delete(event::delete_event))
        .route("/api/v1/{business_id}/events/{slug}/capacity", get(event::get_capacity))

        // Visits
        .route("/api/v1/{business_id}/events/{slug}/visits", post(visit::reserve_visit).get(visit::list_visits))
        .route("/api/v1/{business_id}/visits/{visit_id}/confirm", post(visit::confirm_visit))
        .route("/api/v1/{business_id}/visits/{visit_id}/attend", post(visit::attend_visit))
        .route("/api/v1/{business_id}/visits/{visit_id}/cancel", post(visit::cancel_visit))
        .route("/api/v1/{business_id}/visits/{visit_id}/companions", get(visit::list_companions))

        // Invite links
        .route("/api/v1/visits/by-code/{code}", get(visit::get_visit_by_code))
        .route("/api/v1/visits/by-code/{code}/companions", post(companion::confirm_companion))
        .route("/api/v1/visits/by-code/{code}/calendar.ics", get(visit::download_calendar))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                        business_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}
