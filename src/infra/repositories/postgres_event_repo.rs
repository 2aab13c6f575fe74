use crate::domain::{models::event::Event, ports::{EventRepository, PageRequest}};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PostgresEventRepo {
    async fn create(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, business_id, slug, texts, location, lat, lng,
                start_date, end_date, time_zone_id, time_zone_name,
                visits_limit, visibility, image_url, is_deleted, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
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
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE business_id = $1 AND slug = $2 AND is_deleted = FALSE")
            .bind(business_id).bind(slug)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Event>, AppError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE business_id = $1 AND id = $2")
            .bind(business_id).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self, business_id: &str, page: PageRequest) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE business_id = $1 AND is_deleted = FALSE ORDER BY start_date ASC LIMIT $2 OFFSET $3"
        )
            .bind(business_id).bind(page.limit).bind(page.offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_public(&self, business_id: &str, now: DateTime<Utc>, page: PageRequest) -> Result<Vec<Event>, AppError> {
        sqlx::query_as::<_, Event>(
            "SELECT * FROM events
             WHERE business_id = $1 AND is_deleted = FALSE AND visibility = 'PUBLIC' AND end_date > $2
             ORDER BY start_date ASC LIMIT $3 OFFSET $4"
        )
            .bind(business_id).bind(now).bind(page.limit).bind(page.offset)
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, event: &Event) -> Result<Event, AppError> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events SET
                slug=$1, texts=$2, location=$3, lat=$4, lng=$5,
                start_date=$6, end_date=$7, time_zone_id=$8, time_zone_name=$9,
                visits_limit=$10, visibility=$11, image_url=$12
               WHERE id=$13 AND business_id=$14 AND is_deleted = FALSE RETURNING *"#
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
        let result = sqlx::query("UPDATE events SET is_deleted = TRUE WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE")
            .bind(id).bind(business_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Event not found".into())); }
        Ok(())
    }
}
