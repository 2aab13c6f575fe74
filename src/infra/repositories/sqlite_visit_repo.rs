use crate::domain::{models::visit::Visit, ports::{PageRequest, VisitRepository}};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteVisitRepo {
    pool: SqlitePool,
}

impl SqliteVisitRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitRepository for SqliteVisitRepo {
    async fn create_within_limit(&self, visit: &Visit, visits_limit: Option<i64>) -> Result<Option<Visit>, AppError> {
        // One statement: SQLite takes the write lock before evaluating the
        // subquery, so concurrent reservations cannot both see the old total.
        sqlx::query_as::<_, Visit>(
            "INSERT INTO visits (id, business_id, event_id, client_id, companions_count, code, is_confirmed, is_attended, is_canceled, created_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE ? IS NULL
                OR (SELECT COALESCE(SUM(1 + companions_count), 0) FROM visits WHERE event_id = ? AND is_canceled = 0) + 1 + ? <= ?
             RETURNING *"
        )
            .bind(&visit.id).bind(&visit.business_id).bind(&visit.event_id).bind(&visit.client_id)
            .bind(visit.companions_count).bind(&visit.code)
            .bind(visit.is_confirmed).bind(visit.is_attended).bind(visit.is_canceled).bind(visit.created_at)
            .bind(visits_limit)
            .bind(&visit.event_id).bind(visit.companions_count).bind(visits_limit)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Visit>, AppError> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE business_id = ? AND id = ?")
            .bind(business_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Visit>, AppError> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_active_for_client(&self, event_id: &str, client_id: &str) -> Result<Option<Visit>, AppError> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE event_id = ? AND client_id = ? AND is_canceled = 0")
            .bind(event_id).bind(client_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_by_event(&self, business_id: &str, event_id: &str, page: PageRequest) -> Result<Vec<Visit>, AppError> {
        sqlx::query_as::<_, Visit>(
            "SELECT * FROM visits WHERE business_id = ? AND event_id = ? ORDER BY created_at ASC LIMIT ? OFFSET ?"
        )
            .bind(business_id).bind(event_id).bind(page.limit).bind(page.offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn total_attendance(&self, event_id: &str) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(1 + companions_count), 0) FROM visits WHERE event_id = ? AND is_canceled = 0"
        )
            .bind(event_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_flags(&self, visit: &Visit) -> Result<Visit, AppError> {
        sqlx::query_as::<_, Visit>(
            "UPDATE visits SET is_confirmed = ?, is_attended = ?, is_canceled = ? WHERE id = ? AND business_id = ? RETURNING *"
        )
            .bind(visit.is_confirmed).bind(visit.is_attended).bind(visit.is_canceled)
            .bind(&visit.id).bind(&visit.business_id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
}
