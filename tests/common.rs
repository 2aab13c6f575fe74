use visits_backend::{
    api::router::create_router,
    state::AppState,
    config::Config,
    domain::ports::TimezoneLookup,
    domain::services::datetime::TimezoneInfo,
    error::TimezoneLookupError,
    infra::factory::{build_state, Repositories},
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
    Router,
};
use std::str::FromStr;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tower::ServiceExt;
use serde_json::{json, Value};

/// Stands in for the HTTP timezone service:
/// - longitudes in [-10, 5] resolve to Madrid
/// - longitudes in [-80, -70] resolve to New York
/// - (0, 0) simulates an outage
/// - anything else has no result
pub struct MockTimezoneLookup;

#[async_trait]
impl TimezoneLookup for MockTimezoneLookup {
    async fn lookup(&self, lat: f64, lng: f64, _at: DateTime<Utc>) -> Result<TimezoneInfo, TimezoneLookupError> {
        if lat == 0.0 && lng == 0.0 {
            return Err(TimezoneLookupError::Unavailable("mock outage".into()));
        }
        if (-10.0..=5.0).contains(&lng) {
            return Ok(TimezoneInfo {
                time_zone_id: "Europe/Madrid".into(),
                time_zone_name: "Central European Time".into(),
            });
        }
        if (-80.0..=-70.0).contains(&lng) {
            return Ok(TimezoneInfo {
                time_zone_id: "America/New_York".into(),
                time_zone_name: "Eastern Time".into(),
            });
        }
        Err(TimezoneLookupError::NoResult("ZERO_RESULTS".into()))
    }
}

pub struct AuthHeaders {
    pub access_token: String,
    pub csrf_token: String,
}

/// A business with an active plan and its logged-in admin.
pub struct TestBusiness {
    pub id: String,
    pub slug: String,
    pub admin_secret: String,
    pub auth: AuthHeaders,
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = test_config(db_url);
        let state = Arc::new(
            build_state(&config, Repositories::sqlite(pool.clone()), Arc::new(MockTimezoneLookup))
                .expect("Failed to build test state"),
        );
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    pub async fn send(&self, method: &str, uri: &str, body: Option<Value>, auth: Option<&AuthHeaders>) -> Response {
        self.send_with_headers(method, uri, body, auth, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        auth: Option<&AuthHeaders>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder
                .header(header::COOKIE, format!("access_token={}", auth.access_token))
                .header("X-CSRF-Token", &auth.csrf_token);
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Status plus JSON body (`Null` when the body is empty or not JSON).
    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>, auth: Option<&AuthHeaders>) -> (StatusCode, Value) {
        let response = self.send(method, uri, body, auth).await;
        let status = response.status();
        (status, parse_body(response).await)
    }

    pub async fn login(&self, business_id: &str, username: &str, password: &str) -> AuthHeaders {
        let payload = json!({
            "business_id": business_id,
            "username": username,
            "password": password
        });

        let response = self.send("POST", "/api/v1/auth/login", Some(payload), None).await;

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let access_token = cookie_value(&response, "access_token").expect("No access_token cookie returned");
        let body_json = parse_body(response).await;
        let csrf_token = body_json["csrf_token"].as_str().expect("No csrf_token in body").to_string();

        AuthHeaders {
            access_token,
            csrf_token
        }
    }

    /// Creates a business without a plan and logs its admin in.
    pub async fn create_business_without_plan(&self, slug: &str) -> TestBusiness {
        let (status, body) = self.call(
            "POST",
            "/api/v1/businesses",
            Some(json!({"name": format!("{} Ltd", slug), "slug": slug, "default_time_zone": "Europe/Madrid"})),
            None,
        ).await;
        assert_eq!(status, StatusCode::OK, "business creation failed: {}", body);

        let id = body["business_id"].as_str().unwrap().to_string();
        let admin_secret = body["admin_secret"].as_str().unwrap().to_string();
        let auth = self.login(&id, "admin", &admin_secret).await;

        TestBusiness { id, slug: slug.to_string(), admin_secret, auth }
    }

    pub async fn create_business(&self, slug: &str) -> TestBusiness {
        let business = self.create_business_without_plan(slug).await;
        let (status, body) = self.call(
            "POST",
            &format!("/api/v1/{}/subscription/extend", business.id),
            Some(json!({"months": 12})),
            Some(&business.auth),
        ).await;
        assert_eq!(status, StatusCode::OK, "subscription extension failed: {}", body);
        business
    }

    /// Creates an event `days_ahead` days from now, 10:00-12:00 Madrid time.
    pub async fn create_event(&self, business: &TestBusiness, slug: &str, visits_limit: i32, days_ahead: i64) -> Value {
        let date = (Utc::now() + chrono::Duration::days(days_ahead)).format("%Y-%m-%d").to_string();
        let (status, body) = self.call(
            "POST",
            &format!("/api/v1/{}/events", business.id),
            Some(json!({
                "slug": slug,
                "texts": {
                    "en": {"title": "Guided tour", "description": "A walk through the old town"},
                    "es": {"title": "Visita guiada", "description": "Un paseo por el casco antiguo"}
                },
                "location": "Plaza Mayor",
                "start_date": date,
                "start_time": "10:00",
                "end_date": date,
                "end_time": "12:00",
                "lat": 40.4168,
                "lng": -3.7038,
                "visits_limit": visits_limit
            })),
            Some(&business.auth),
        ).await;
        assert_eq!(status, StatusCode::OK, "event creation failed: {}", body);
        body
    }

    pub async fn reserve(&self, business: &TestBusiness, event_slug: &str, email: &str, companions: i32) -> (StatusCode, Value) {
        self.call(
            "POST",
            &format!("/api/v1/{}/events/{}/visits", business.id, event_slug),
            Some(json!({"email": email, "name": "Guest", "companions_count": companions})),
            None,
        ).await
    }

    pub async fn confirm_companion(&self, code: &str, email: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            &format!("/api/v1/visits/by-code/{}/companions", code),
            Some(json!({"email": email, "name": "Companion"})),
            None,
        ).await
    }
}

pub fn test_config(database_url: String) -> Config {
    let priv_key_pem = include_str!("../tests/keys/test_private.pem");
    let pub_key_pem = include_str!("../tests/keys/test_public.pem");

    Config {
        database_url,
        port: 0,
        jwt_secret_key: priv_key_pem.to_string(),
        jwt_public_key: pub_key_pem.to_string(),
        auth_issuer: "test-issuer".to_string(),
        timezone_api_url: "http://localhost".to_string(),
        timezone_api_key: "test".to_string(),
        timezone_lookup_timeout: Duration::from_secs(2),
        unlimited_companion_cap: 30,
        public_base_url: "https://visits.test".to_string(),
        default_time_zone: "UTC".to_string(),
    }
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    response.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|c| c.starts_with(&prefix))
        .map(|c| c[prefix.len()..].split(';').next().unwrap_or_default().to_string())
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
