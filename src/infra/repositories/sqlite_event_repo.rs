use crate::domain::{models::event::Event, ports::{EventRepository, PageRequest}};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteEventRepo {
    pool: SqlitePool,
}

impl SqliteEventRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for SqliteEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, business_id, slug, texts, location, lat, lng,
                start_date, end_date, time_zone_id, time_zone_name,
                visits_limit, visibility, image_url, is_deleted, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *"#
        )
            .bind(&event.id)
            .bind(&event.business_id)
            .bind(&event.slug)
            .bind(&event.texts)
            .bind(&event.location)
            .bind(event.lat)
            .bind(event.lng)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.time_zone_id)
            .bind(&event.time_zone_name)
            .bind(event.visits_limit)
            .bind(&event.visibility)
            .bind(&event.image_url)
            .bind(event.is_deleted)
            .bind(event.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_slug(&self, business_id: &str, slug: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE business_id = ? AND slug = ? AND is_deleted = 0",
        )
            .bind(business_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE business_id = ? AND id = ?",
        )
            .bind(business_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list(&self, business_id: &str, page: PageRequest) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE business_id = ? AND is_deleted = 0 ORDER BY start_date ASC LIMIT ? OFFSET ?",
        )
            .bind(business_id)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_public(&self, business_id: &str, now: DateTime<Utc>, page: PageRequest) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events
             WHERE business_id = ? AND is_deleted = 0 AND visibility = 'PUBLIC' AND end_date > ?
             ORDER BY start_date ASC LIMIT ? OFFSET ?",
        )
            .bind(business_id)
            .bind(now)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                slug=?, texts=?, location=?, lat=?, lng=?,
                start_date=?, end_date=?, time_zone_id=?, time_zone_name=?,
                visits_limit=?, visibility=?, image_url=?
               WHERE id=? AND business_id=? AND is_deleted = 0 RETURNING *"#
        )
            .bind(&event.slug)
            .bind(&event.texts)
            .bind(&event.location)
            .bind(event.lat)
            .bind(event.lng)
            .bind(event.start_date)
            .bind(event.end_date)
            .bind(&event.time_zone_id)
            .bind(&event.time_zone_name)
            .bind(event.visits_limit)
            .bind(&event.visibility)
            .bind(&event.image_url)
            .bind(&event.id)
            .bind(&event.business_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn soft_delete(&self, business_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE events SET is_deleted = 1 WHERE id = ? AND business_id = ? AND is_deleted = 0")
            .bind(id)
            .bind(business_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Event not found".into()));
        }
        Ok(())
    }
}
