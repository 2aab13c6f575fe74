use crate::domain::{
    models::companion::{ClientCompanion, CompanionInsert},
    ports::CompanionRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

pub struct SqliteCompanionRepo {
    pool: SqlitePool,
}

impl SqliteCompanionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanionRepository for SqliteCompanionRepo {
    async fn find(&self, visit_id: &str, client_id: &str) -> Result<Option<ClientCompanion>, AppError> {
        sqlx::query_as::<_, ClientCompanion>("SELECT * FROM client_companions WHERE visit_id = ? AND client_id = ?")
            .bind(visit_id)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn count_by_visit(&self, visit_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM client_companions WHERE visit_id = ?")
            .bind(visit_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_visit(&self, visit_id: &str) -> Result<Vec<ClientCompanion>, AppError> {
        sqlx::query_as::<_, ClientCompanion>("SELECT * FROM client_companions WHERE visit_id = ? ORDER BY created_at ASC")
            .bind(visit_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn create_within_allotment(&self, companion: &ClientCompanion) -> Result<CompanionInsert, AppError> {
        let inserted = sqlx::query_as::<_, ClientCompanion>(
            "INSERT INTO client_companions (id, visit_id, client_id, created_at)
             SELECT ?, ?, ?, ?
             WHERE (SELECT COUNT(*) FROM client_companions WHERE visit_id = ?)
                 < (SELECT companions_count FROM visits WHERE id = ?)
               AND NOT EXISTS (SELECT 1 FROM visits WHERE id = ? AND (is_canceled = 1 OR is_attended = 1))
             RETURNING *"
        )
            .bind(&companion.id)
            .bind(&companion.visit_id)
            .bind(&companion.client_id)
            .bind(companion.created_at)
            .bind(&companion.visit_id)
            .bind(&companion.visit_id)
            .bind(&companion.visit_id)
            .fetch_optional(&self.pool)
            .await;

        match inserted {
            Ok(Some(row)) => Ok(CompanionInsert::Inserted(row)),
            Ok(None) => {
                // A concurrent duplicate may have taken the last slot.
                if let Some(existing) = self.find(&companion.visit_id, &companion.client_id).await? {
                    return Ok(CompanionInsert::AlreadyConfirmed(existing));
                }
                let closed: Option<i64> = sqlx::query_scalar("SELECT is_canceled + is_attended FROM visits WHERE id = ?")
                    .bind(&companion.visit_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(AppError::Database)?;
                match closed {
                    None => Err(AppError::NotFound("Visit not found".into())),
                    Some(0) => Ok(CompanionInsert::Full),
                    Some(_) => Ok(CompanionInsert::VisitClosed),
                }
            }
            Err(e) if e.as_database_error().is_some_and(|d| d.is_unique_violation()) => {
                debug!("Duplicate companion confirmation for visit {}", companion.visit_id);
                self.find(&companion.visit_id, &companion.client_id).await?
                    .map(CompanionInsert::AlreadyConfirmed)
                    .ok_or(AppError::Internal)
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }
}
