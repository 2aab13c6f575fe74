use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Business {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub default_time_zone: String,
    pub plan_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Business {
    pub fn new(name: String, slug: String, default_time_zone: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            slug,
            logo_url: None,
            default_time_zone,
            plan_expires_at: None,
            created_at: Utc::now(),
        }
    }
}
