use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::quote::QuoteDraft;

/// One leg of the trip as read from the customer's email.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtractedStop {
    pub city: String,
    #[serde(default = "one")]
    pub nights: u32,
    #[serde(default)]
    pub hotel: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

fn one() -> u32 {
    1
}

/// Trip parameters extracted from a freeform email.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtractedTrip {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub tour_name: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub pax: Option<u32>,
    #[serde(default)]
    pub tour_pack_type: Option<String>,
    #[serde(default)]
    pub stops: Vec<ExtractedStop>,
    #[serde(default)]
    pub guide_services: Vec<String>,
}

/// Advisory result: a draft for staff to review plus everything that could
/// not be matched.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MatchedDraft {
    pub draft: QuoteDraft,
    pub warnings: Vec<String>,
}
