use crate::domain::{
    models::companion::{ClientCompanion, CompanionInsert},
    ports::CompanionRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCompanionRepo {
    pool: PgPool,
}

impl PostgresCompanionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanionRepository for PostgresCompanionRepo {
    async fn find(&self, visit_id: &str, client_id: &str) -> Result<Option<ClientCompanion>, AppError> {
        sqlx::query_as::<_, ClientCompanion>("SELECT * FROM client_companions WHERE visit_id = $1 AND client_id = $2")
            .bind(visit_id).bind(client_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn count_by_visit(&self, visit_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM client_companions WHERE visit_id = $1")
            .bind(visit_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_visit(&self, visit_id: &str) -> Result<Vec<ClientCompanion>, AppError> {
        sqlx::query_as::<_, ClientCompanion>("SELECT * FROM client_companions WHERE visit_id = $1 ORDER BY created_at ASC")
            .bind(visit_id)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn create_within_allotment(&self, companion: &ClientCompanion) -> Result<CompanionInsert, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // The visit row lock orders this against staff cancel/attend updates.
        let visit: Option<(i32, bool, bool)> = sqlx::query_as(
            "SELECT companions_count, is_canceled, is_attended FROM visits WHERE id = $1 FOR UPDATE"
        )
            .bind(&companion.visit_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
        let Some((allotment, is_canceled, is_attended)) = visit else {
            return Err(AppError::NotFound("Visit not found".into()));
        };

        let existing = sqlx::query_as::<_, ClientCompanion>("SELECT * FROM client_companions WHERE visit_id = $1 AND client_id = $2")
            .bind(&companion.visit_id).bind(&companion.client_id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?;
        if let Some(existing) = existing {
            tx.commit().await.map_err(AppError::Database)?;
            return Ok(CompanionInsert::AlreadyConfirmed(existing));
        }

        if is_canceled || is_attended {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(CompanionInsert::VisitClosed);
        }

        let confirmed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM client_companions WHERE visit_id = $1")
            .bind(&companion.visit_id)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
        if confirmed >= allotment as i64 {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(CompanionInsert::Full);
        }

        let created = sqlx::query_as::<_, ClientCompanion>(
            "INSERT INTO client_companions (id, visit_id, client_id, created_at) VALUES ($1, $2, $3, $4) RETURNING *"
        )
            .bind(&companion.id).bind(&companion.visit_id).bind(&companion.client_id).bind(companion.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(CompanionInsert::Inserted(created))
    }
}
