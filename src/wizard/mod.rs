//! Three-step business registration wizard.
//!
//! Owner details, then business details, then location and hours. Each
//! forward move validates only the current step; moving back never
//! validates. The aggregated payload is submitted once, from the last step.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::business::{default_opening_hours, Weekday};
use crate::models::signup::BusinessSignupPayload;
use crate::utils::validation::{normalize_eircode, FieldErrors};

pub mod client;
pub mod rules;

pub use client::{HttpRegistrationClient, SubmissionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Owner,
    Business,
    Location,
}

impl WizardStep {
    pub const ALL: [WizardStep; 3] = [WizardStep::Owner, WizardStep::Business, WizardStep::Location];

    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Owner => 1,
            WizardStep::Business => 2,
            WizardStep::Location => 3,
        }
    }

    pub fn fields(&self) -> &'static [WizardField] {
        use WizardField::*;
        match self {
            WizardStep::Owner => &[FullName, Email, Password, ConfirmPassword],
            WizardStep::Business => &[BusinessName, BusinessCategory, PhoneNumber, Website],
            WizardStep::Location => &[Address, City, County, Eircode],
        }
    }

    fn next(&self) -> WizardStep {
        match self {
            WizardStep::Owner => WizardStep::Business,
            WizardStep::Business | WizardStep::Location => WizardStep::Location,
        }
    }

    fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Owner => None,
            WizardStep::Business => Some(WizardStep::Owner),
            WizardStep::Location => Some(WizardStep::Business),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardField {
    FullName,
    Email,
    Password,
    ConfirmPassword,
    BusinessName,
    BusinessCategory,
    PhoneNumber,
    Website,
    Address,
    City,
    County,
    Eircode,
}

impl WizardField {
    /// Wire name, also used as the error key.
    pub fn name(&self) -> &'static str {
        match self {
            WizardField::FullName => "fullName",
            WizardField::Email => "email",
            WizardField::Password => "password",
            WizardField::ConfirmPassword => "confirmPassword",
            WizardField::BusinessName => "businessName",
            WizardField::BusinessCategory => "businessCategory",
            WizardField::PhoneNumber => "phoneNumber",
            WizardField::Website => "website",
            WizardField::Address => "address",
            WizardField::City => "city",
            WizardField::County => "county",
            WizardField::Eircode => "eircode",
        }
    }

    pub fn step(&self) -> WizardStep {
        WizardStep::ALL
            .into_iter()
            .find(|step| step.fields().contains(self))
            .unwrap_or(WizardStep::Owner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStatus {
    Editing(WizardStep),
    Submitting,
    Success,
    Closed,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub business_id: Uuid,
    pub message: String,
}

#[async_trait]
pub trait RegistrationSubmitter: Send + Sync {
    async fn submit(
        &self,
        payload: &BusinessSignupPayload,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

#[async_trait]
pub trait EmailAvailability: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, SubmissionError>;
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("the wizard is not on the final step")]
    NotOnFinalStep,
    #[error("the current step has {} invalid field(s)", .0.len())]
    InvalidStep(FieldErrors),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

fn non_blank(value: String) -> Option<String> {
    Some(value).filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct RegistrationWizard {
    data: BusinessSignupPayload,
    status: WizardStatus,
    errors: FieldErrors,
    server_error: Option<String>,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    pub fn new() -> Self {
        Self {
            data: BusinessSignupPayload {
                opening_hours: default_opening_hours(),
                ..Default::default()
            },
            status: WizardStatus::Editing(WizardStep::Owner),
            errors: FieldErrors::new(),
            server_error: None,
        }
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn step(&self) -> Option<WizardStep> {
        match self.status {
            WizardStatus::Editing(step) => Some(step),
            _ => None,
        }
    }

    pub fn data(&self) -> &BusinessSignupPayload {
        &self.data
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    pub fn set_field(&mut self, field: WizardField, value: impl Into<String>) {
        let value = value.into();

        match field {
            WizardField::FullName => self.data.full_name = value,
            WizardField::Email => self.data.email = value,
            WizardField::Password => self.data.password = value,
            WizardField::ConfirmPassword => self.data.confirm_password = value,
            WizardField::BusinessName => self.data.business_name = value,
            WizardField::BusinessCategory => self.data.business_category = value,
            WizardField::PhoneNumber => self.data.phone_number = value,
            WizardField::Website => self.data.website = non_blank(value),
            WizardField::Address => self.data.address = value,
            WizardField::City => self.data.city = value,
            WizardField::County => self.data.county = value,
            WizardField::Eircode => {
                self.data.eircode = non_blank(value).map(|e| normalize_eircode(&e))
            }
        }
    }

    pub fn set_day_open(&mut self, day: Weekday, is_open: bool) {
        if let Some(schedule) = self.data.opening_hours.get_mut(&day) {
            schedule.is_open = is_open;
        }
    }

    pub fn set_day_hours(&mut self, day: Weekday, start: &str, end: &str) {
        if let Some(schedule) = self.data.opening_hours.get_mut(&day) {
            schedule.start = Some(start.to_string());
            schedule.end = Some(end.to_string());
        }
    }

    /// Swaps in fresh errors for `step`, leaving other steps' errors alone.
    fn replace_step_errors(&mut self, step: WizardStep, errors: FieldErrors) -> bool {
        self.errors
            .remove_all(step.fields().iter().map(WizardField::name));
        let valid = errors.is_empty();
        self.errors.extend(errors);
        valid
    }

    fn advance_from(&mut self, step: WizardStep) {
        self.status = WizardStatus::Editing(step.next());
    }

    /// Validates the current step and moves forward when it passes.
    pub fn next(&mut self) -> bool {
        let Some(step) = self.step() else {
            return false;
        };
        let errors = rules::validate_step(step, &self.data);
        if !self.replace_step_errors(step, errors) {
            return false;
        }
        self.advance_from(step);
        true
    }

    /// Like [`next`](Self::next), but also asks the server whether the email
    /// is taken when leaving the first step. A failed lookup is not fatal.
    pub async fn next_checked(&mut self, availability: &dyn EmailAvailability) -> bool {
        let Some(step) = self.step() else {
            return false;
        };
        let mut errors = rules::validate_step(step, &self.data);

        if step == WizardStep::Owner && !errors.contains(WizardField::Email.name()) {
            match availability.email_exists(self.data.email.trim()).await {
                Ok(true) => errors.insert(WizardField::Email.name(), rules::EMAIL_TAKEN),
                Ok(false) => {}
                Err(err) => warn!(error = %err, "email availability check failed"),
            }
        }

        if !self.replace_step_errors(step, errors) {
            return false;
        }
        self.advance_from(step);
        true
    }

    /// Steps back without validating. Going back from the first step
    /// closes the wizard.
    pub fn back(&mut self) -> WizardStatus {
        if let WizardStatus::Editing(step) = self.status {
            self.status = match step.previous() {
                Some(previous) => WizardStatus::Editing(previous),
                None => WizardStatus::Closed,
            };
        }
        self.status
    }

    pub fn payload(&self) -> BusinessSignupPayload {
        self.data.clone()
    }

    /// Sends the whole payload once. On failure the wizard stays on the
    /// last step with every entered value intact.
    pub async fn submit(
        &mut self,
        submitter: &dyn RegistrationSubmitter,
    ) -> Result<SubmissionReceipt, WizardError> {
        if self.status != WizardStatus::Editing(WizardStep::Location) {
            return Err(WizardError::NotOnFinalStep);
        }
        let errors = rules::validate_step(WizardStep::Location, &self.data);
        if !self.replace_step_errors(WizardStep::Location, errors) {
            return Err(WizardError::InvalidStep(self.errors.clone()));
        }

        self.status = WizardStatus::Submitting;
        self.server_error = None;

        match submitter.submit(&self.payload()).await {
            Ok(receipt) => {
                self.status = WizardStatus::Success;
                Ok(receipt)
            }
            Err(err) => {
                self.status = WizardStatus::Editing(WizardStep::Location);
                self.server_error = Some(err.user_message());
                if let SubmissionError::Rejected { field_errors, .. } = &err {
                    self.errors.extend(field_errors.clone());
                }
                Err(err.into())
            }
        }
    }

    /// Reopens at step 1 with the initial data.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
