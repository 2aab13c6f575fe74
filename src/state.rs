use std::sync::Arc;
use crate::domain::ports::{
    AuthRepository, BusinessRepository, ClientRepository, CompanionRepository,
    EventRepository, UserRepository, VisitRepository,
};
use crate::domain::services::{
    auth_service::AuthService, datetime::DateTimeReconciler, reservation_service::ReservationService,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub business_repo: Arc<dyn BusinessRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub auth_repo: Arc<dyn AuthRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub client_repo: Arc<dyn ClientRepository>,
    pub visit_repo: Arc<dyn VisitRepository>,
    pub companion_repo: Arc<dyn CompanionRepository>,
    pub auth_service: Arc<AuthService>,
    pub reconciler: Arc<DateTimeReconciler>,
    pub reservations: Arc<ReservationService>,
}
