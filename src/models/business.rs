use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const BUSINESS_CATEGORIES: [&str; 10] = [
    "Restaurants & Catering",
    "Retail",
    "Professional Services",
    "Health & Wellness",
    "Technology",
    "Beauty & Personal Care",
    "Education & Training",
    "Home Services",
    "Automotive",
    "Entertainment",
];

pub const DEFAULT_OPENING_TIME: &str = "09:00";
pub const DEFAULT_CLOSING_TIME: &str = "17:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub is_open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

pub type OpeningHours = BTreeMap<Weekday, DaySchedule>;

/// Weekdays open 09:00-17:00, weekends closed with the same times pre-filled.
pub fn default_opening_hours() -> OpeningHours {
    Weekday::ALL
        .iter()
        .map(|day| {
            (
                *day,
                DaySchedule {
                    is_open: !day.is_weekend(),
                    start: Some(DEFAULT_OPENING_TIME.to_string()),
                    end: Some(DEFAULT_CLOSING_TIME.to_string()),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub category: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub eircode: String,
    #[sqlx(json)]
    pub opening_hours: OpeningHours,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBusiness {
    pub name: String,
    pub category: String,
    pub phone: String,
    pub website: String,
    pub address: String,
    pub city: String,
    pub county: String,
    pub eircode: String,
    pub opening_hours: OpeningHours,
}
