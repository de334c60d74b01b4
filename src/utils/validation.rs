use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::business::{OpeningHours, Weekday, BUSINESS_CATEGORIES};
use crate::models::signup::{BusinessSignupPayload, SignupPayload};
use crate::utils::password::password_policy_violation;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+\d{1,3}[- ]?)?\d{10}$").expect("phone regex"));
static WEBSITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[\w-]+(\.[\w-]+)+[/#?]?.*$").expect("website regex"));
static EIRCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]\d{2}[A-Z0-9]{4}$").expect("eircode regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time regex"));

/// Field name to message. Only failing fields are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(field, message);
        errors
    }

    /// Keeps the first message recorded for a field.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, message) in other.0 {
            self.insert(&field, message);
        }
    }

    pub fn remove_all<'a>(&mut self, fields: impl IntoIterator<Item = &'a str>) {
        for field in fields {
            self.0.remove(field);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// Whitespace is ignored, so "+353 87 123 4567" style input is accepted.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

pub fn is_valid_website(url: &str) -> bool {
    WEBSITE_RE.is_match(url.trim())
}

/// Eircodes are stored trimmed and uppercase.
pub fn normalize_eircode(eircode: &str) -> String {
    eircode.trim().to_ascii_uppercase()
}

pub fn is_valid_eircode(eircode: &str) -> bool {
    EIRCODE_RE.is_match(&normalize_eircode(eircode))
}

pub fn is_valid_time(value: &str) -> bool {
    TIME_RE.is_match(value)
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn too_short(value: &str, min: usize) -> bool {
    value.trim().chars().count() < min
}

pub fn validate_signup(payload: &SignupPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if blank(&payload.email) {
        errors.insert("email", "Email is required");
    } else if !is_valid_email(&payload.email) {
        errors.insert("email", "Invalid email address");
    }

    if let Some(message) = password_policy_violation(&payload.password) {
        errors.insert("password", message);
    }

    errors
}

/// Server-side check of the full wizard payload. Unlike the wizard, all
/// three steps are validated in one pass.
pub fn validate_business_signup(payload: &BusinessSignupPayload) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if too_short(&payload.full_name, 2) {
        errors.insert("fullName", "Full name must be at least 2 characters");
    }
    if !is_valid_email(&payload.email) {
        errors.insert("email", "Invalid email address");
    }
    if let Some(message) = password_policy_violation(&payload.password) {
        errors.insert("password", message);
    }
    if payload.password != payload.confirm_password {
        errors.insert("confirmPassword", "Passwords don't match");
    }

    if too_short(&payload.business_name, 2) {
        errors.insert(
            "businessName",
            "Business name must be at least 2 characters",
        );
    }
    let category = payload.business_category.trim();
    if category.is_empty() {
        errors.insert("businessCategory", "Business category is required");
    } else if !BUSINESS_CATEGORIES.contains(&category) {
        errors.insert("businessCategory", "Unknown business category");
    }
    if !is_valid_phone(&payload.phone_number) {
        errors.insert("phoneNumber", "Invalid phone number");
    }
    if let Some(website) = payload.website.as_deref().filter(|w| !blank(w)) {
        if !is_valid_website(website) {
            errors.insert("website", "Invalid website URL");
        }
    }

    if too_short(&payload.address, 5) {
        errors.insert("address", "Address must be at least 5 characters");
    }
    if too_short(&payload.city, 2) {
        errors.insert("city", "City is required");
    }
    if too_short(&payload.county, 2) {
        errors.insert("county", "County is required");
    }
    if let Some(eircode) = payload.eircode.as_deref().filter(|e| !blank(e)) {
        if !is_valid_eircode(eircode) {
            errors.insert("eircode", "Invalid Eircode format");
        }
    }

    errors.extend(validate_opening_hours(&payload.opening_hours));
    errors
}

/// Every day must be present. Open days need `HH:MM` start and end times
/// with start before end.
pub fn validate_opening_hours(hours: &OpeningHours) -> FieldErrors {
    let mut errors = FieldErrors::new();

    for day in Weekday::ALL {
        let key = format!("openingHours.{}", day);
        let Some(schedule) = hours.get(&day) else {
            errors.insert(&key, "Missing opening hours");
            continue;
        };
        if !schedule.is_open {
            continue;
        }
        match (schedule.start.as_deref(), schedule.end.as_deref()) {
            (Some(start), Some(end)) if is_valid_time(start) && is_valid_time(end) => {
                // zero-padded HH:MM compares correctly as text
                if start >= end {
                    errors.insert(&key, "Opening time must be before closing time");
                }
            }
            _ => errors.insert(&key, "Open days need start and end times (HH:MM)"),
        }
    }

    errors
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::business::{default_opening_hours, DaySchedule};

    pub(crate) fn valid_business_payload() -> BusinessSignupPayload {
        BusinessSignupPayload {
            full_name: "Aoife Byrne".into(),
            email: "aoife@example.com".into(),
            password: "Secret123".into(),
            confirm_password: "Secret123".into(),
            business_name: "Byrne Bakery".into(),
            business_category: "Retail".into(),
            phone_number: "+353 871234567".into(),
            website: Some("https://byrne.ie".into()),
            address: "1 Main Street".into(),
            city: "Galway".into(),
            county: "Galway".into(),
            eircode: Some("H91AB12".into()),
            opening_hours: default_opening_hours(),
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("a@b.ie"));
        assert!(is_valid_email("  spaced@example.com "));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("two words@example.com"));
        assert!(!is_valid_email("missing@tld"));
    }

    #[test]
    fn phone_format() {
        assert!(is_valid_phone("0871234567"));
        assert!(is_valid_phone("+353 871234567"));
        assert!(is_valid_phone("+1-800555 1234"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+353 87 12"));
    }

    #[test]
    fn website_and_eircode_format() {
        assert!(is_valid_website("https://example.com"));
        assert!(is_valid_website("http://shop.example.ie/about"));
        assert!(!is_valid_website("example.com"));
        assert!(!is_valid_website("ftp://example.com"));

        assert!(is_valid_eircode("D02X285"));
        assert!(is_valid_eircode(" d02x285 "));
        assert_eq!(normalize_eircode(" h91ab12 "), "H91AB12");
        assert!(!is_valid_eircode("D02 X285"));
        assert!(!is_valid_eircode("902X285"));
    }

    #[test]
    fn field_errors_keep_first_message() {
        let mut errors = FieldErrors::new();
        errors.insert("email", "first");
        errors.insert("email", "second");
        assert_eq!(errors.get("email"), Some("first"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn field_errors_serialize_as_flat_map() {
        let errors = FieldErrors::single("confirmPassword", "Passwords don't match");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["confirmPassword"], "Passwords don't match");
    }

    #[test]
    fn valid_business_payload_passes() {
        assert!(validate_business_signup(&valid_business_payload()).is_empty());
    }

    #[test]
    fn business_payload_reports_every_failing_field() {
        let mut payload = valid_business_payload();
        payload.full_name = "A".into();
        payload.confirm_password = "Different123".into();
        payload.phone_number = "123".into();
        payload.address = "Rd".into();
        payload.website = Some("".into());
        payload.eircode = None;

        let errors = validate_business_signup(&payload);
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["address", "confirmPassword", "fullName", "phoneNumber"]
        );
    }

    #[test]
    fn unknown_category_rejected() {
        let mut payload = valid_business_payload();
        payload.business_category = "Space Tourism".into();
        let errors = validate_business_signup(&payload);
        assert_eq!(errors.get("businessCategory"), Some("Unknown business category"));
    }

    #[test]
    fn opening_hours_require_ordered_times_on_open_days() {
        let mut hours = default_opening_hours();
        hours.insert(
            Weekday::Monday,
            DaySchedule {
                is_open: true,
                start: Some("18:00".into()),
                end: Some("09:00".into()),
            },
        );
        hours.insert(
            Weekday::Tuesday,
            DaySchedule {
                is_open: true,
                start: Some("9am".into()),
                end: None,
            },
        );
        hours.insert(
            Weekday::Sunday,
            DaySchedule {
                is_open: false,
                start: None,
                end: None,
            },
        );

        let errors = validate_opening_hours(&hours);
        assert!(errors.contains("openingHours.monday"));
        assert!(errors.contains("openingHours.tuesday"));
        assert!(!errors.contains("openingHours.sunday"));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn business_payload_needs_every_day_of_the_week() {
        let mut payload = valid_business_payload();
        payload.opening_hours = OpeningHours::new();
        let errors = validate_business_signup(&payload);
        assert_eq!(errors.len(), 7);
        for day in Weekday::ALL {
            assert_eq!(
                errors.get(&format!("openingHours.{day}")),
                Some("Missing opening hours")
            );
        }

        let mut partial = default_opening_hours();
        partial.remove(&Weekday::Sunday);
        payload.opening_hours = partial;
        let errors = validate_business_signup(&payload);
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["openingHours.sunday"]
        );
    }

    #[test]
    fn signup_requires_email_and_strong_password() {
        let errors = validate_signup(&SignupPayload {
            email: "".into(),
            password: "weak".into(),
            name: None,
        });
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );
    }
}
