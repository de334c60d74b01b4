use serde::{Deserialize, Serialize};

use super::business::{NewBusiness, OpeningHours};
use crate::utils::validation::normalize_eircode;

/// Consumer registration body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignupPayload {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The aggregate of all three wizard steps, sent once on final submission.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSignupPayload {
    // Step 1: owner
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,

    // Step 2: business
    pub business_name: String,
    pub business_category: String,
    pub phone_number: String,
    #[serde(default)]
    pub website: Option<String>,

    // Step 3: location and hours
    pub address: String,
    pub city: String,
    pub county: String,
    #[serde(default)]
    pub eircode: Option<String>,
    #[serde(default)]
    pub opening_hours: OpeningHours,
}

impl BusinessSignupPayload {
    pub fn to_new_business(&self) -> NewBusiness {
        NewBusiness {
            name: self.business_name.trim().to_string(),
            category: self.business_category.trim().to_string(),
            phone: self.phone_number.trim().to_string(),
            website: self
                .website
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            county: self.county.trim().to_string(),
            eircode: self
                .eircode
                .as_deref()
                .map(normalize_eircode)
                .unwrap_or_default(),
            opening_hours: self.opening_hours.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailPayload {
    pub email: String,
}
