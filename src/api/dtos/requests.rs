use crate::domain::models::event::{LocalizedTexts, Visibility};
use crate::domain::ports::PageRequest;
use crate::domain::services::datetime::ScheduleInput;
use crate::error::FieldErrors;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateBusinessRequest {
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub default_time_zone: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateBusinessRequest {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub default_time_zone: Option<String>,
}

#[derive(Deserialize)]
pub struct ExtendSubscriptionRequest {
    pub months: u32,
}

#[derive(Deserialize)]
pub struct CreateMemberRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub slug: String,
    pub texts: LocalizedTexts,
    pub location: Option<String>,
    #[serde(flatten)]
    pub schedule: ScheduleInput,
    #[serde(default)]
    pub visits_limit: i32,
    pub visibility: Option<String>,
    pub image_url: Option<String>,
}

impl CreateEventRequest {
    /// Checks everything except the schedule, which the reconciler owns.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_slug(&self.slug, &mut errors);
        validate_texts(&self.texts, &mut errors);
        validate_limit(self.visits_limit, &mut errors);
        if let Some(v) = &self.visibility {
            validate_visibility(v, &mut errors);
        }
        errors
    }
}

#[derive(Deserialize, Default)]
pub struct UpdateEventRequest {
    pub slug: Option<String>,
    pub texts: Option<LocalizedTexts>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub time_zone_id: Option<String>,
    pub visits_limit: Option<i32>,
    pub visibility: Option<String>,
    pub image_url: Option<String>,
}

impl UpdateEventRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(slug) = &self.slug {
            validate_slug(slug, &mut errors);
        }
        if let Some(texts) = &self.texts {
            validate_texts(texts, &mut errors);
        }
        if let Some(limit) = self.visits_limit {
            validate_limit(limit, &mut errors);
        }
        if let Some(v) = &self.visibility {
            validate_visibility(v, &mut errors);
        }
        errors
    }

    pub fn touches_schedule(&self) -> bool {
        self.start_date.is_some()
            || self.start_time.is_some()
            || self.end_date.is_some()
            || self.end_time.is_some()
            || self.lat.is_some()
            || self.lng.is_some()
            || self.time_zone_id.is_some()
    }
}

#[derive(Deserialize)]
pub struct ReserveVisitRequest {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub companions_count: i32,
}

impl ReserveVisitRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_contact(&self.email, &self.name, &mut errors);
        errors
    }
}

#[derive(Deserialize)]
pub struct ConfirmCompanionRequest {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
}

impl ConfirmCompanionRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validate_contact(&self.email, &self.name, &mut errors);
        errors
    }
}

#[derive(Deserialize, Default)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

fn validate_slug(slug: &str, errors: &mut FieldErrors) {
    if slug.is_empty() {
        errors.add("slug", "Slug is required");
    } else if !slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        errors.add("slug", "Slug may only contain lowercase letters, digits and dashes");
    }
}

fn validate_texts(texts: &LocalizedTexts, errors: &mut FieldErrors) {
    if texts.is_empty() {
        errors.add("texts", "At least one language is required");
    }
    for (locale, text) in texts {
        if text.title.trim().is_empty() {
            errors.add("texts", format!("Title for '{}' is empty", locale));
        }
    }
}

fn validate_limit(visits_limit: i32, errors: &mut FieldErrors) {
    if visits_limit < 0 {
        errors.add("visits_limit", "Visits limit must be zero (unlimited) or positive");
    }
}

fn validate_visibility(visibility: &str, errors: &mut FieldErrors) {
    if let Err(msg) = visibility.parse::<Visibility>() {
        errors.add("visibility", msg);
    }
}

fn validate_contact(email: &str, name: &str, errors: &mut FieldErrors) {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => errors.add("email", "A valid email address is required"),
    }
    if name.trim().is_empty() {
        errors.add("name", "Name is required");
    }
}
