use crate::domain::{models::visit::Visit, ports::{PageRequest, VisitRepository}};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresVisitRepo {
    pool: PgPool,
}

impl PostgresVisitRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const ATTENDANCE_SQL: &str =
    "SELECT COALESCE(SUM(1 + companions_count), 0)::BIGINT FROM visits WHERE event_id = $1 AND is_canceled = FALSE";

#[async_trait]
impl VisitRepository for PostgresVisitRepo {
    async fn create_within_limit(&self, visit: &Visit, visits_limit: Option<i64>) -> Result<Option<Visit>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // The event row lock serializes reservations for the same event.
        sqlx::query("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(&visit.event_id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;

        if let Some(limit) = visits_limit {
            let held: i64 = sqlx::query_scalar(ATTENDANCE_SQL)
                .bind(&visit.event_id)
                .fetch_one(&mut *tx).await.map_err(AppError::Database)?;
            if held + 1 + visit.companions_count as i64 > limit {
                tx.rollback().await.map_err(AppError::Database)?;
                return Ok(None);
            }
        }

        let created = sqlx::query_as::<_, Visit>(
            "INSERT INTO visits (id, business_id, event_id, client_id, companions_count, code, is_confirmed, is_attended, is_canceled, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *"
        )
            .bind(&visit.id).bind(&visit.business_id).bind(&visit.event_id).bind(&visit.client_id)
            .bind(visit.companions_count).bind(&visit.code)
            .bind(visit.is_confirmed).bind(visit.is_attended).bind(visit.is_canceled).bind(visit.created_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(created))
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Visit>, AppError> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE business_id = $1 AND id = $2")
            .bind(business_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Visit>, AppError> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_active_for_client(&self, event_id: &str, client_id: &str) -> Result<Option<Visit>, AppError> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE event_id = $1 AND client_id = $2 AND is_canceled = FALSE")
            .bind(event_id).bind(client_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, business_id: &str, event_id: &str, page: PageRequest) -> Result<Vec<Visit>, AppError> {
        sqlx::query_as::<_, Visit>(
            "SELECT * FROM visits WHERE business_id = $1 AND event_id = $2 ORDER BY created_at ASC LIMIT $3 OFFSET $4"
        )
            .bind(business_id).bind(event_id).bind(page.limit).bind(page.offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn total_attendance(&self, event_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(ATTENDANCE_SQL)
            .bind(event_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_flags(&self, visit: &Visit) -> Result<Visit, AppError> {
        sqlx::query_as::<_, Visit>(
            "UPDATE visits SET is_confirmed = $1, is_attended = $2, is_canceled = $3 WHERE id = $4 AND business_id = $5 RETURNING *"
        )
            .bind(visit.is_confirmed).bind(visit.is_attended).bind(visit.is_canceled)
            .bind(&visit.id).bind(&visit.business_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
