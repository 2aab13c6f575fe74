use crate::domain::ports::TimezoneLookup;
use crate::domain::services::datetime::TimezoneInfo;
use crate::error::TimezoneLookupError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Resolves coordinates through the Google Time Zone API. Lookups are not
/// retried; the caller's deadline bounds the whole request.
pub struct GoogleTimezoneService {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimezoneApiResponse {
    status: String,
    time_zone_id: Option<String>,
    time_zone_name: Option<String>,
    error_message: Option<String>,
}

impl GoogleTimezoneService {
    pub fn new(api_url: String, api_key: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl TimezoneLookup for GoogleTimezoneService {
    #[instrument(skip(self))]
    async fn lookup(&self, lat: f64, lng: f64, at: DateTime<Utc>) -> Result<TimezoneInfo, TimezoneLookupError> {
        let res = self.client.get(&self.api_url)
            .query(&[
                ("location", format!("{},{}", lat, lng)),
                ("timestamp", at.timestamp().to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Timezone API connection error: {:?}", e);
                TimezoneLookupError::Unavailable(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            warn!("Timezone API returned {}: {}", status, text);
            return Err(TimezoneLookupError::Unavailable(format!("HTTP {}", status)));
        }

        let body: TimezoneApiResponse = res.json().await.map_err(|e| {
            error!("Failed to parse timezone API response: {:?}", e);
            TimezoneLookupError::Unavailable("Malformed response".to_string())
        })?;

        match (body.status.as_str(), body.time_zone_id) {
            ("OK", Some(time_zone_id)) => {
                debug!("Resolved ({}, {}) to {}", lat, lng, time_zone_id);
                Ok(TimezoneInfo {
                    time_zone_name: body.time_zone_name.unwrap_or_else(|| time_zone_id.clone()),
                    time_zone_id,
                })
            }
            (other, _) => {
                let detail = body.error_message.unwrap_or_else(|| other.to_string());
                warn!("Timezone API gave no zone for ({}, {}): {}", lat, lng, detail);
                Err(TimezoneLookupError::NoResult(detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer) -> GoogleTimezoneService {
        GoogleTimezoneService::new(format!("{}/timezone/json", server.uri()), "test-key".into(), Duration::from_secs(2))
    }

    fn june() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn resolves_zone_from_ok_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("location", "40.4168,-3.7038"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "dstOffset": 3600,
                "rawOffset": 3600,
                "status": "OK",
                "timeZoneId": "Europe/Madrid",
                "timeZoneName": "Central European Summer Time"
            })))
            .mount(&server)
            .await;

        let info = service(&server).lookup(40.4168, -3.7038, june()).await.unwrap();
        assert_eq!(info.time_zone_id, "Europe/Madrid");
        assert_eq!(info.time_zone_name, "Central European Summer Time");
    }

    #[tokio::test]
    async fn zero_results_is_no_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ZERO_RESULTS"
            })))
            .mount(&server)
            .await;

        let err = service(&server).lookup(0.0, -160.0, june()).await.unwrap_err();
        assert_eq!(err, TimezoneLookupError::NoResult("ZERO_RESULTS".into()));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = service(&server).lookup(40.0, -3.0, june()).await.unwrap_err();
        assert!(matches!(err, TimezoneLookupError::Unavailable(_)));
    }
}
