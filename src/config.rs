use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret_key: String, // Private key (PEM)
    pub jwt_public_key: String, // Public key (PEM)
    pub auth_issuer: String,
    pub timezone_api_url: String,
    pub timezone_api_key: String,
    pub timezone_lookup_timeout: Duration,
    /// Companion ceiling per visit when an event has no visits limit.
    pub unlimited_companion_cap: u32,
    /// Base of the companion confirmation link handed to registrants.
    pub public_base_url: String,
    pub default_time_zone: String,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.visits.local".to_string()),
            timezone_api_url: env::var("TIMEZONE_API_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api/timezone/json".to_string()),
            timezone_api_key: env::var("TIMEZONE_API_KEY").unwrap_or_default(),
            timezone_lookup_timeout: Duration::from_secs(
                env::var("TIMEZONE_LOOKUP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .expect("TIMEZONE_LOOKUP_TIMEOUT_SECS must be a number"),
            ),
            unlimited_companion_cap: env::var("UNLIMITED_COMPANION_CAP")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("UNLIMITED_COMPANION_CAP must be a number"),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            default_time_zone: env::var("DEFAULT_TIME_ZONE").unwrap_or_else(|_| "UTC".to_string()),
        }
    }
}
