use crate::domain::{models::business::Business, ports::BusinessRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteBusinessRepo {
    pool: SqlitePool,
}

impl SqliteBusinessRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BusinessRepository for SqliteBusinessRepo {
    async fn create(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            "INSERT INTO businesses (id, name, slug, logo_url, default_time_zone, plan_expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&business.id)
            .bind(&business.name)
            .bind(&business.slug)
            .bind(&business.logo_url)
            .bind(&business.default_time_zone)
            .bind(business.plan_expires_at)
            .bind(business.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Business>, AppError> {
        sqlx::query_as::<_, Business>("SELECT * FROM businesses WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update(&self, business: &Business) -> Result<Business, AppError> {
        sqlx::query_as::<_, Business>(
            "UPDATE businesses SET name=?, logo_url=?, default_time_zone=?, plan_expires_at=? WHERE id=? RETURNING *"
        )
            .bind(&business.name)
            .bind(&business.logo_url)
            .bind(&business.default_time_zone)
            .bind(business.plan_expires_at)
            .bind(&business.id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
