use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// End client who reserves visits or confirms as a companion. Identified by
/// a normalized email address across all businesses.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ClientProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClientProfile {
    pub fn new(email: &str, name: String, phone: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            name,
            phone,
            created_at: Utc::now(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
