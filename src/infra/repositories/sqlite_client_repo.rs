use crate::domain::{models::client::ClientProfile, ports::ClientRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteClientRepo {
    pool: SqlitePool,
}

impl SqliteClientRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for SqliteClientRepo {
    async fn upsert_by_email(&self, client: &ClientProfile) -> Result<ClientProfile, AppError> {
        // DO UPDATE (not DO NOTHING) so RETURNING yields the existing row.
        sqlx::query_as::<_, ClientProfile>(
            "INSERT INTO clients (id, email, name, phone, created_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET phone = COALESCE(clients.phone, excluded.phone)
             RETURNING *"
        )
            .bind(&client.id)
            .bind(&client.email)
            .bind(&client.name)
            .bind(&client.phone)
            .bind(client.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClientProfile>, AppError> {
        sqlx::query_as::<_, ClientProfile>("SELECT * FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
