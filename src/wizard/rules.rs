//! Client-side checks run before the wizard leaves a step. These are looser
//! than the server's: presence and format only, no length minimums.

use crate::models::signup::BusinessSignupPayload;
use crate::utils::password::password_policy_violation;
use crate::utils::validation::{
    is_valid_eircode, is_valid_email, is_valid_phone, is_valid_website, FieldErrors,
};

use super::{WizardField, WizardStep};

pub const EMAIL_TAKEN: &str = "Email already registered";

pub fn field_value(data: &BusinessSignupPayload, field: WizardField) -> &str {
    match field {
        WizardField::FullName => &data.full_name,
        WizardField::Email => &data.email,
        WizardField::Password => &data.password,
        WizardField::ConfirmPassword => &data.confirm_password,
        WizardField::BusinessName => &data.business_name,
        WizardField::BusinessCategory => &data.business_category,
        WizardField::PhoneNumber => &data.phone_number,
        WizardField::Website => data.website.as_deref().unwrap_or_default(),
        WizardField::Address => &data.address,
        WizardField::City => &data.city,
        WizardField::County => &data.county,
        WizardField::Eircode => data.eircode.as_deref().unwrap_or_default(),
    }
}

fn required(value: &str, message: &'static str) -> Option<&'static str> {
    value.trim().is_empty().then_some(message)
}

/// The message for the first rule `field` breaks, if any.
pub fn check_field(field: WizardField, data: &BusinessSignupPayload) -> Option<&'static str> {
    let value = field_value(data, field);

    match field {
        WizardField::FullName => required(value, "Full name is required"),
        WizardField::Email => required(value, "Email is required").or_else(|| {
            (!is_valid_email(value)).then_some("Invalid email format")
        }),
        WizardField::Password => password_policy_violation(value),
        WizardField::ConfirmPassword => {
            (value != data.password).then_some("Passwords do not match")
        }
        WizardField::BusinessName => required(value, "Business name is required"),
        WizardField::BusinessCategory => required(value, "Business category is required"),
        WizardField::PhoneNumber => required(value, "Phone number is required").or_else(|| {
            (!is_valid_phone(value)).then_some("Invalid phone number format")
        }),
        WizardField::Website => {
            (!value.trim().is_empty() && !is_valid_website(value)).then_some("Invalid website URL")
        }
        WizardField::Address => required(value, "Address is required"),
        WizardField::City => required(value, "City is required"),
        WizardField::County => required(value, "County is required"),
        WizardField::Eircode => {
            (!value.trim().is_empty() && !is_valid_eircode(value))
                .then_some("Invalid Eircode format")
        }
    }
}

pub fn validate_step(step: WizardStep, data: &BusinessSignupPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in step.fields() {
        if let Some(message) = check_field(*field, data) {
            errors.insert(field.name(), message);
        }
    }
    errors
}
