use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::models::{
    client::ClientProfile,
    companion::{ClientCompanion, CompanionInsert},
    event::{Event, Visibility},
    visit::{NewVisitParams, Visit},
};
use crate::domain::ports::{ClientRepository, CompanionRepository, VisitRepository};
use crate::domain::services::capacity::{self, CompanionProgress, ReservationRejection};
use crate::error::{AppError, FieldErrors};

/// Who is reserving or confirming; resolved to a `ClientProfile` by email.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacitySummary {
    pub visits_limit: Option<i64>,
    pub total_attendance: i64,
    pub remaining: Option<i64>,
    pub max_companions: u32,
    pub is_full: bool,
}

#[derive(Debug, Serialize)]
pub struct Reservation {
    pub visit: Visit,
    pub client: ClientProfile,
    pub invite_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanionStatus {
    pub companions_count: i32,
    pub confirmed: i64,
    pub progress: CompanionProgress,
}

#[derive(Debug)]
pub enum CompanionConfirmation {
    Confirmed(ClientCompanion),
    AlreadyConfirmed(ClientCompanion),
}

pub struct ReservationService {
    clients: Arc<dyn ClientRepository>,
    visits: Arc<dyn VisitRepository>,
    companions: Arc<dyn CompanionRepository>,
    unlimited_companion_cap: u32,
    public_base_url: String,
}

impl ReservationService {
    pub fn new(
        clients: Arc<dyn ClientRepository>,
        visits: Arc<dyn VisitRepository>,
        companions: Arc<dyn CompanionRepository>,
        unlimited_companion_cap: u32,
        public_base_url: String,
    ) -> Self {
        Self {
            clients,
            visits,
            companions,
            unlimited_companion_cap,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn capacity_summary(&self, event: &Event) -> Result<CapacitySummary, AppError> {
        let total_attendance = self.visits.total_attendance(&event.id).await?;
        let remaining = capacity::remaining_capacity(event.capacity(), total_attendance);

        Ok(CapacitySummary {
            visits_limit: event.capacity().as_limit(),
            total_attendance,
            remaining: remaining.as_option(),
            max_companions: capacity::max_companions_for(remaining, self.unlimited_companion_cap),
            is_full: !capacity::has_room_for_registrant(remaining),
        })
    }

    /// Reserves one seat for the client plus `requested_companions` seats for
    /// people they will invite through the visit code.
    pub async fn reserve(
        &self,
        event: &Event,
        identity: ClientIdentity,
        requested_companions: i32,
        now: DateTime<Utc>,
    ) -> Result<Reservation, AppError> {
        if event.is_deleted || event.visibility() == Visibility::Private {
            return Err(AppError::NotFound("Event not found".into()));
        }
        if event.has_finished(now) {
            return Err(AppError::Validation("This event has already finished".into()));
        }

        let client = self.clients
            .upsert_by_email(&ClientProfile::new(&identity.email, identity.name, identity.phone))
            .await?;

        if self.visits.find_active_for_client(&event.id, &client.id).await?.is_some() {
            return Err(AppError::Conflict("You already have a reservation for this event".into()));
        }

        let total_attendance = self.visits.total_attendance(&event.id).await?;
        let remaining = capacity::remaining_capacity(event.capacity(), total_attendance);
        if !capacity::has_room_for_registrant(remaining) {
            info!("Reservation rejected: event {} is full ({} held)", event.id, total_attendance);
            return Err(AppError::CapacityExceeded(ReservationRejection::FullyBooked.to_string()));
        }

        let max_companions = capacity::max_companions_for(remaining, self.unlimited_companion_cap);
        let companions = capacity::validate_reservation(requested_companions, max_companions)
            .map_err(rejection_to_error)?;

        let visit = Visit::new(NewVisitParams {
            business_id: event.business_id.clone(),
            event_id: event.id.clone(),
            client_id: client.id.clone(),
            companions_count: companions as i32,
        });

        let created = self.visits
            .create_within_limit(&visit, event.capacity().as_limit())
            .await?
            .ok_or_else(|| {
                warn!("Reservation for event {} lost a race for the last seats", event.id);
                AppError::CapacityExceeded(ReservationRejection::FullyBooked.to_string())
            })?;

        info!("Visit {} reserved for event {} with {} companions", created.id, event.id, companions);
        let invite_url = self.invite_url(&event.slug, &created.code);
        Ok(Reservation { visit: created, client, invite_url })
    }

    /// Adds the client as a companion of `visit`. Confirming twice returns the
    /// existing row instead of inserting another.
    pub async fn confirm_companion(&self, visit: &Visit, identity: ClientIdentity) -> Result<CompanionConfirmation, AppError> {
        if visit.is_terminal() {
            return Err(closed_visit_error());
        }

        let client = self.clients
            .upsert_by_email(&ClientProfile::new(&identity.email, identity.name, identity.phone))
            .await?;

        if client.id == visit.client_id {
            return Err(AppError::Fields(FieldErrors::single(
                "email",
                "The registrant cannot confirm as their own companion",
            )));
        }

        if let Some(existing) = self.companions.find(&visit.id, &client.id).await? {
            return Ok(CompanionConfirmation::AlreadyConfirmed(existing));
        }

        let confirmed = self.companions.count_by_visit(&visit.id).await?;
        capacity::check_companion_slot(confirmed, visit.companions_count)
            .map_err(|e| AppError::CapacityExceeded(e.to_string()))?;

        match self.companions.create_within_allotment(&ClientCompanion::new(visit.id.clone(), client.id)).await? {
            CompanionInsert::Inserted(companion) => {
                info!("Companion {} confirmed for visit {}", companion.client_id, visit.id);
                Ok(CompanionConfirmation::Confirmed(companion))
            }
            CompanionInsert::AlreadyConfirmed(companion) => Ok(CompanionConfirmation::AlreadyConfirmed(companion)),
            CompanionInsert::Full => Err(AppError::CapacityExceeded(capacity::CompanionRejection::Full.to_string())),
            CompanionInsert::VisitClosed => {
                info!("Companion refused: visit {} closed before the insert", visit.id);
                Err(closed_visit_error())
            }
        }
    }

    pub async fn companion_status(&self, visit: &Visit) -> Result<CompanionStatus, AppError> {
        let confirmed = self.companions.count_by_visit(&visit.id).await?;
        Ok(CompanionStatus {
            companions_count: visit.companions_count,
            confirmed,
            progress: capacity::companion_progress(confirmed, visit.companions_count),
        })
    }

    pub fn invite_url(&self, event_slug: &str, code: &str) -> String {
        format!("{}/{}/invite/{}", self.public_base_url, event_slug, code)
    }
}

fn closed_visit_error() -> AppError {
    AppError::Conflict("This reservation is no longer open to companions".into())
}

fn rejection_to_error(rejection: ReservationRejection) -> AppError {
    match rejection {
        ReservationRejection::NegativeCompanions => {
            AppError::Fields(FieldErrors::single("companions_count", rejection.to_string()))
        }
        ReservationRejection::FullyBooked | ReservationRejection::TooManyCompanions { .. } => {
            AppError::CapacityExceeded(rejection.to_string())
        }
    }
}
