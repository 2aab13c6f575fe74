use crate::domain::models::{
    business::Business, user::User, event::Event, visit::Visit, client::ClientProfile,
    companion::{ClientCompanion, CompanionInsert}, auth::RefreshTokenRecord,
};
use crate::domain::services::datetime::TimezoneInfo;
use crate::error::{AppError, TimezoneLookupError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

impl PageRequest {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Pages are 1-based; out-of-range values are clamped.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(Self::DEFAULT_PER_PAGE).clamp(1, Self::MAX_PER_PAGE);
        Self {
            limit: per_page as i64,
            offset: (page as i64 - 1) * per_page as i64,
        }
    }
}

#[async_trait]
pub trait BusinessRepository: Send + Sync {
    async fn create(&self, business: &Business) -> Result<Business, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Business>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Business>, AppError>;
    async fn update(&self, business: &Business) -> Result<Business, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_username(&self, business_id: &str, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<User>, AppError>;
    async fn list_by_business(&self, business_id: &str) -> Result<Vec<User>, AppError>;
    async fn delete(&self, business_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    async fn delete_refresh_token(&self, token_hash: &str) -> Result<(), AppError>;
    async fn delete_refresh_family(&self, family_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, event: &Event) -> Result<Event, AppError>;
    /// Soft-deleted events are not returned.
    async fn find_by_slug(&self, business_id: &str, slug: &str) -> Result<Option<Event>, AppError>;
    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Event>, AppError>;
    async fn list(&self, business_id: &str, page: PageRequest) -> Result<Vec<Event>, AppError>;
    /// Upcoming public events, earliest first.
    async fn list_public(&self, business_id: &str, now: DateTime<Utc>, page: PageRequest) -> Result<Vec<Event>, AppError>;
    async fn update(&self, event: &Event) -> Result<Event, AppError>;
    async fn soft_delete(&self, business_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Returns the stored profile for the email, creating it from `client`
    /// when absent. Existing names are kept.
    async fn upsert_by_email(&self, client: &ClientProfile) -> Result<ClientProfile, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ClientProfile>, AppError>;
}

#[async_trait]
pub trait VisitRepository: Send + Sync {
    /// Inserts the visit only if the event's aggregate attendance plus
    /// `1 + companions_count` stays within `visits_limit` (`None` = unlimited).
    /// The check and the insert are atomic; `None` means no room was left.
    async fn create_within_limit(&self, visit: &Visit, visits_limit: Option<i64>) -> Result<Option<Visit>, AppError>;
    async fn find_by_id(&self, business_id: &str, id: &str) -> Result<Option<Visit>, AppError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Visit>, AppError>;
    async fn find_active_for_client(&self, event_id: &str, client_id: &str) -> Result<Option<Visit>, AppError>;
    async fn list_by_event(&self, business_id: &str, event_id: &str, page: PageRequest) -> Result<Vec<Visit>, AppError>;
    /// Seats held by non-canceled visits: each counts its registrant plus its
    /// companion allotment.
    async fn total_attendance(&self, event_id: &str) -> Result<i64, AppError>;
    async fn update_flags(&self, visit: &Visit) -> Result<Visit, AppError>;
}

#[async_trait]
pub trait CompanionRepository: Send + Sync {
    async fn find(&self, visit_id: &str, client_id: &str) -> Result<Option<ClientCompanion>, AppError>;
    async fn count_by_visit(&self, visit_id: &str) -> Result<i64, AppError>;
    async fn list_by_visit(&self, visit_id: &str) -> Result<Vec<ClientCompanion>, AppError>;
    /// Inserts unless the visit already holds `companions_count` companions or
    /// the client already confirmed; atomic with the check.
    async fn create_within_allotment(&self, companion: &ClientCompanion) -> Result<CompanionInsert, AppError>;
}

/// External coordinate -> IANA timezone resolution.
#[async_trait]
pub trait TimezoneLookup: Send + Sync {
    async fn lookup(&self, lat: f64, lng: f64, at: DateTime<Utc>) -> Result<TimezoneInfo, TimezoneLookupError>;
}
