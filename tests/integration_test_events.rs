mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::{json, Value};

fn event_payload(slug: &str, start: (&str, &str), end: (&str, &str)) -> Value {
    json!({
        "slug": slug,
        "texts": {
            "en": {"title": "Open day", "description": "Come and see"},
            "es": {"title": "Jornada de puertas abiertas", "description": "Ven a vernos"}
        },
        "start_date": start.0,
        "start_time": start.1,
        "end_date": end.0,
        "end_time": end.1,
        "lat": 40.4168,
        "lng": -3.7038,
        "visits_limit": 20
    })
}

#[tokio::test]
async fn coordinate_resolves_zone_and_offset_follows_daylight_saving() {
    let app = TestApp::new().await;
    let biz = app.create_business("museo").await;

    let (status, summer) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(event_payload("summer", ("2030-07-01", "10:00"), ("2030-07-01", "12:00"))),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", summer);
    assert_eq!(summer["time_zone_id"], "Europe/Madrid");
    assert_eq!(summer["start_date"], "2030-07-01T08:00:00Z");
    assert_eq!(summer["end_date"], "2030-07-01T10:00:00Z");

    let (status, winter) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(event_payload("winter", ("2030-01-15", "10:00"), ("2030-01-15", "12:00"))),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", winter);
    assert_eq!(winter["start_date"], "2030-01-15T09:00:00Z");
}

#[tokio::test]
async fn same_date_overnight_range_is_rejected_on_end_date() {
    let app = TestApp::new().await;
    let biz = app.create_business("late-night").await;

    let (status, body) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(event_payload("party", ("2030-06-01", "22:00"), ("2030-06-01", "02:00"))),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["end_date"].is_array());

    let (status, _) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(event_payload("party", ("2030-06-01", "10:00"), ("2030-06-01", "10:00"))),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_fields_are_reported_per_field() {
    let app = TestApp::new().await;
    let biz = app.create_business("forms").await;

    let (status, body) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(json!({
            "slug": "broken",
            "texts": {"en": {"title": "Broken"}},
            "start_date": "2030-13-01",
            "start_time": "25:00",
            "end_date": "2030-06-01",
            "visits_limit": 5
        })),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    for field in ["start_date", "start_time", "end_time"] {
        assert!(body["fields"][field].is_array(), "missing {} in {}", field, body);
    }
}

#[tokio::test]
async fn failed_lookup_blocks_save_with_generic_error() {
    let app = TestApp::new().await;
    let biz = app.create_business("offline").await;

    let mut payload = event_payload("nowhere", ("2030-06-01", "10:00"), ("2030-06-01", "12:00"));
    payload["lat"] = json!(0.0);
    payload["lng"] = json!(0.0);

    let (status, body) = app.call("POST", &format!("/api/v1/{}/events", biz.id), Some(payload), Some(&biz.auth)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Could not resolve location/timezone");

    let mut ocean = event_payload("ocean", ("2030-06-01", "10:00"), ("2030-06-01", "12:00"));
    ocean["lng"] = json!(-160.0);
    let (status, _) = app.call("POST", &format!("/api/v1/{}/events", biz.id), Some(ocean), Some(&biz.auth)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, list) = app.call("GET", &format!("/api/v1/{}/events", biz.id), None, Some(&biz.auth)).await;
    assert_eq!(list["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn without_coordinate_explicit_zone_then_business_default_apply() {
    let app = TestApp::new().await;
    let biz = app.create_business("zones").await;

    let (status, explicit) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(json!({
            "slug": "ny",
            "texts": {"en": {"title": "NY"}},
            "start_date": "2030-07-01", "start_time": "09:00",
            "end_date": "2030-07-01", "end_time": "10:00",
            "time_zone_id": "America/New_York"
        })),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", explicit);
    assert_eq!(explicit["start_date"], "2030-07-01T13:00:00Z");
    assert_eq!(explicit["visits_limit"], 0);

    // business default is Europe/Madrid
    let (status, fallback) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(json!({
            "slug": "local",
            "texts": {"en": {"title": "Local"}},
            "start_date": "2030-07-01", "start_time": "09:00",
            "end_date": "2030-07-01", "end_time": "10:00"
        })),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", fallback);
    assert_eq!(fallback["time_zone_id"], "Europe/Madrid");
    assert_eq!(fallback["start_date"], "2030-07-01T07:00:00Z");

    let (status, body) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(json!({
            "slug": "mars",
            "texts": {"en": {"title": "Mars"}},
            "start_date": "2030-07-01", "start_time": "09:00",
            "end_date": "2030-07-01", "end_time": "10:00",
            "time_zone_id": "Mars/Olympus_Mons"
        })),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["fields"]["time_zone_id"].is_array());
}

#[tokio::test]
async fn event_creation_requires_active_plan() {
    let app = TestApp::new().await;
    let biz = app.create_business_without_plan("unpaid").await;

    let (status, _) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(event_payload("tour", ("2030-06-01", "10:00"), ("2030-06-01", "12:00"))),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn public_view_is_localized_and_respects_visibility() {
    let app = TestApp::new().await;
    let biz = app.create_business("galeria").await;
    app.create_event(&biz, "tour", 10, 7).await;

    let response = app.send_with_headers(
        "GET", &format!("/api/v1/{}/events/tour", biz.id), None, None,
        &[("Accept-Language", "es-ES,es;q=0.9"), ("X-Time-Zone", "America/New_York")],
    ).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = common::parse_body(response).await;
    assert_eq!(view["title"], "Visita guiada");
    assert!(view["local_start"].as_str().unwrap().contains("T10:00:00"));
    assert!(view["viewer_start"].is_string());
    assert!(view.get("texts").is_none());

    let (_, fallback) = app.call("GET", &format!("/api/v1/{}/events/tour", biz.id), None, None).await;
    assert_eq!(fallback["title"], "Guided tour");

    // staff see the stored record
    let (_, raw) = app.call("GET", &format!("/api/v1/{}/events/tour", biz.id), None, Some(&biz.auth)).await;
    assert_eq!(raw["texts"]["es"]["title"], "Visita guiada");

    let (status, _) = app.call(
        "PUT", &format!("/api/v1/{}/events/tour", biz.id),
        Some(json!({"visibility": "PRIVATE"})),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call("GET", &format!("/api/v1/{}/events/tour", biz.id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call("GET", &format!("/api/v1/{}/events/tour", biz.id), None, Some(&biz.auth)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn public_listing_shows_only_upcoming_public_events() {
    let app = TestApp::new().await;
    let biz = app.create_business("listing").await;
    app.create_event(&biz, "later", 0, 20).await;
    app.create_event(&biz, "sooner", 0, 5).await;
    app.create_event(&biz, "hidden", 0, 6).await;
    app.create_event(&biz, "gone", 0, 7).await;

    app.call("PUT", &format!("/api/v1/{}/events/hidden", biz.id), Some(json!({"visibility": "UNLISTED"})), Some(&biz.auth)).await;
    let (status, _) = app.call("DELETE", &format!("/api/v1/{}/events/gone", biz.id), None, Some(&biz.auth)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("GET", &format!("/api/v1/{}/public/events", biz.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = body["items"].as_array().unwrap().iter().map(|e| e["slug"].as_str().unwrap()).collect();
    assert_eq!(slugs, vec!["sooner", "later"]);

    // unlisted is still reachable by slug, deleted is not
    let (status, _) = app.call("GET", &format!("/api/v1/{}/events/hidden", biz.id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call("GET", &format!("/api/v1/{}/events/gone", biz.id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = app.call("GET", &format!("/api/v1/{}/public/events?page=2&per_page=1", biz.id), None, None).await;
    assert_eq!(page["items"][0]["slug"], "later");
    assert_eq!(page["page"], 2);
    assert_eq!(page["per_page"], 1);
}

#[tokio::test]
async fn update_re_reconciles_schedule_in_event_zone() {
    let app = TestApp::new().await;
    let biz = app.create_business("updates").await;

    let (status, _) = app.call(
        "POST", &format!("/api/v1/{}/events", biz.id),
        Some(event_payload("tour", ("2030-07-01", "10:00"), ("2030-07-01", "12:00"))),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK);

    let (status, updated) = app.call(
        "PUT", &format!("/api/v1/{}/events/tour", biz.id),
        Some(json!({"end_time": "14:30"})),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["start_date"], "2030-07-01T08:00:00Z");
    assert_eq!(updated["end_date"], "2030-07-01T12:30:00Z");

    let (status, _) = app.call(
        "PUT", &format!("/api/v1/{}/events/tour", biz.id),
        Some(json!({"start_time": "15:00"})),
        Some(&biz.auth),
    ).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn staff_of_another_business_cannot_manage_events() {
    let app = TestApp::new().await;
    let owner = app.create_business("owner").await;
    let intruder = app.create_business("intruder").await;
    app.create_event(&owner, "tour", 10, 7).await;

    let (status, _) = app.call("DELETE", &format!("/api/v1/{}/events/tour", owner.id), None, Some(&intruder.auth)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("GET", &format!("/api/v1/{}/events", owner.id), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
