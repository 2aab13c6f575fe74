use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ClientCompanion {
    pub id: String,
    pub visit_id: String,
    pub client_id: String,
    pub created_at: DateTime<Utc>,
}

impl ClientCompanion {
    pub fn new(visit_id: String, client_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            visit_id,
            client_id,
            created_at: Utc::now(),
        }
    }
}

/// Result of the storage-level conditional insert.
#[derive(Debug)]
pub enum CompanionInsert {
    Inserted(ClientCompanion),
    AlreadyConfirmed(ClientCompanion),
    Full,
    /// The visit was canceled or attended by the time of the insert.
    VisitClosed,
}
