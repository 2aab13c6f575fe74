use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use rand::{distributions::Alphanumeric, Rng};
use thiserror::Error;

const CODE_LENGTH: usize = 12;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Visit {
    pub id: String,
    pub business_id: String,
    pub event_id: String,
    pub client_id: String,
    pub companions_count: i32,
    pub code: String,
    pub is_confirmed: bool,
    pub is_attended: bool,
    pub is_canceled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Reserved,
    Confirmed,
    Attended,
    Canceled,
}

pub struct NewVisitParams {
    pub business_id: String,
    pub event_id: String,
    pub client_id: String,
    pub companions_count: i32,
}

impl Visit {
    pub fn new(params: NewVisitParams) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            business_id: params.business_id,
            event_id: params.event_id,
            client_id: params.client_id,
            companions_count: params.companions_count,
            code: generate_code(),
            is_confirmed: false,
            is_attended: false,
            is_canceled: false,
            created_at: Utc::now(),
        }
    }

    /// Canceled and attended are terminal.
    pub fn status(&self) -> VisitStatus {
        if self.is_canceled {
            VisitStatus::Canceled
        } else if self.is_attended {
            VisitStatus::Attended
        } else if self.is_confirmed {
            VisitStatus::Confirmed
        } else {
            VisitStatus::Reserved
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.is_canceled || self.is_attended
    }

    pub fn confirm(&mut self) -> Result<(), VisitTransitionError> {
        self.ensure_open()?;
        self.is_confirmed = true;
        Ok(())
    }

    /// Repeating the action on an attended visit is a no-op.
    pub fn mark_attended(&mut self) -> Result<(), VisitTransitionError> {
        if self.is_canceled {
            return Err(VisitTransitionError::Canceled);
        }
        self.is_confirmed = true;
        self.is_attended = true;
        Ok(())
    }

    /// Releases the seats the visit holds. Canceling twice is a no-op.
    pub fn cancel(&mut self) -> Result<(), VisitTransitionError> {
        if self.is_attended && !self.is_canceled {
            return Err(VisitTransitionError::Attended);
        }
        self.is_canceled = true;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), VisitTransitionError> {
        if self.is_canceled {
            Err(VisitTransitionError::Canceled)
        } else if self.is_attended {
            Err(VisitTransitionError::Attended)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VisitTransitionError {
    #[error("This visit was canceled")]
    Canceled,
    #[error("This visit has already been attended")]
    Attended,
}

fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit() -> Visit {
        Visit::new(NewVisitParams {
            business_id: "b1".into(),
            event_id: "e1".into(),
            client_id: "c1".into(),
            companions_count: 2,
        })
    }

    #[test]
    fn new_visit_is_reserved_with_a_fresh_code() {
        let a = visit();
        let b = visit();
        assert_eq!(a.status(), VisitStatus::Reserved);
        assert_eq!(a.code.len(), CODE_LENGTH);
        assert_ne!(a.code, b.code);
    }

    #[test]
    fn staff_transitions_end_in_terminal_states() {
        let mut v = visit();
        v.confirm().unwrap();
        assert_eq!(v.status(), VisitStatus::Confirmed);

        v.mark_attended().unwrap();
        assert_eq!(v.status(), VisitStatus::Attended);
        assert!(v.is_terminal());
        assert_eq!(v.cancel(), Err(VisitTransitionError::Attended));
        assert_eq!(v.confirm(), Err(VisitTransitionError::Attended));

        let mut w = visit();
        w.cancel().unwrap();
        w.cancel().unwrap();
        assert_eq!(w.status(), VisitStatus::Canceled);
        assert_eq!(w.mark_attended(), Err(VisitTransitionError::Canceled));
        assert_eq!(w.confirm(), Err(VisitTransitionError::Canceled));
    }
}
