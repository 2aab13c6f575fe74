use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::ports::{
    AuthRepository, BusinessRepository, ClientRepository, CompanionRepository,
    EventRepository, TimezoneLookup, UserRepository, VisitRepository,
};
use crate::domain::services::{
    auth_service::AuthService, datetime::DateTimeReconciler, reservation_service::ReservationService,
};
use crate::error::AppError;
use crate::infra::timezone::google_timezone_service::GoogleTimezoneService;
use crate::infra::repositories::{
    postgres_auth_repo::PostgresAuthRepo, postgres_business_repo::PostgresBusinessRepo,
    postgres_client_repo::PostgresClientRepo, postgres_companion_repo::PostgresCompanionRepo,
    postgres_event_repo::PostgresEventRepo, postgres_user_repo::PostgresUserRepo,
    postgres_visit_repo::PostgresVisitRepo,
    sqlite_auth_repo::SqliteAuthRepo, sqlite_business_repo::SqliteBusinessRepo,
    sqlite_client_repo::SqliteClientRepo, sqlite_companion_repo::SqliteCompanionRepo,
    sqlite_event_repo::SqliteEventRepo, sqlite_user_repo::SqliteUserRepo,
    sqlite_visit_repo::SqliteVisitRepo,
};

/// One implementation per port, all sharing a pool.
pub struct Repositories {
    pub business_repo: Arc<dyn BusinessRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub client_repo: Arc<dyn ClientRepository>,
    pub visit_repo: Arc<dyn VisitRepository>,
    pub companion_repo: Arc<dyn CompanionRepository>,
}

impl Repositories {
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self {
            business_repo: Arc::new(SqliteBusinessRepo::new(pool.clone())),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            auth_repo: Arc::new(SqliteAuthRepo::new(pool.clone())),
            event_repo: Arc::new(SqliteEventRepo::new(pool.clone())),
            client_repo: Arc::new(SqliteClientRepo::new(pool.clone())),
            visit_repo: Arc::new(SqliteVisitRepo::new(pool.clone())),
            companion_repo: Arc::new(SqliteCompanionRepo::new(pool)),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            business_repo: Arc::new(PostgresBusinessRepo::new(pool.clone())),
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            auth_repo: Arc::new(PostgresAuthRepo::new(pool.clone())),
            event_repo: Arc::new(PostgresEventRepo::new(pool.clone())),
            client_repo: Arc::new(PostgresClientRepo::new(pool.clone())),
            visit_repo: Arc::new(PostgresVisitRepo::new(pool.clone())),
            companion_repo: Arc::new(PostgresCompanionRepo::new(pool)),
        }
    }
}

/// Wires services on top of `repos`. Tests use this with their own pool and
/// a stub `TimezoneLookup`.
pub fn build_state(config: &Config, repos: Repositories, timezone_lookup: Arc<dyn TimezoneLookup>) -> Result<AppState, AppError> {
    let auth_service = Arc::new(AuthService::new(repos.auth_repo.clone(), config.clone())?);
    let reconciler = Arc::new(DateTimeReconciler::new(timezone_lookup, config.timezone_lookup_timeout));
    let reservations = Arc::new(ReservationService::new(
        repos.client_repo.clone(),
        repos.visit_repo.clone(),
        repos.companion_repo.clone(),
        config.unlimited_companion_cap,
        config.public_base_url.clone(),
    ));

    Ok(AppState {
        config: config.clone(),
        business_repo: repos.business_repo,
        user_repo: repos.user_repo,
        auth_repo: repos.auth_repo,
        event_repo: repos.event_repo,
        client_repo: repos.client_repo,
        visit_repo: repos.visit_repo,
        companion_repo: repos.companion_repo,
        auth_service,
        reconciler,
        reservations,
    })
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let timezone_lookup = Arc::new(GoogleTimezoneService::new(
        config.timezone_api_url.clone(),
        config.timezone_api_key.clone(),
        config.timezone_lookup_timeout,
    ));

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;
        Repositories::postgres(pool)
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;
        Repositories::sqlite(pool)
    };

    build_state(config, repos, timezone_lookup).expect("Failed to build application state")
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
