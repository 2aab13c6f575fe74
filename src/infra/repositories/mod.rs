pub mod sqlite_auth_repo;
pub mod sqlite_business_repo;
pub mod sqlite_client_repo;
pub mod sqlite_companion_repo;
pub mod sqlite_event_repo;
pub mod sqlite_user_repo;
pub mod sqlite_visit_repo;

pub mod postgres_auth_repo;
pub mod postgres_business_repo;
pub mod postgres_client_repo;
pub mod postgres_companion_repo;
pub mod postgres_event_repo;
pub mod postgres_user_repo;
pub mod postgres_visit_repo;
