use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

fn one() -> u32 {
    1
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredefinedDayService {
    pub service_id: ObjectId,
    #[serde(default)]
    pub order: u32,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredefinedTourDay {
    pub day_number: u32,
    pub city_id: ObjectId,
    pub hotel_id: ObjectId,
    #[serde(default)]
    pub services: Vec<PredefinedDayService>,
    #[serde(default)]
    pub guide_service_ids: Vec<ObjectId>,
}

/// Reusable itinerary template. Prices are not stored; they are resolved
/// for the quote's pax tier when the template is applied.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PredefinedTourQuote {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tour_pack_type_id: Option<ObjectId>,
    #[serde(default)]
    pub days: Vec<PredefinedTourDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl PredefinedTourQuote {
    /// Days in itinerary order.
    pub fn ordered_days(&self) -> Vec<&PredefinedTourDay> {
        let mut days: Vec<&PredefinedTourDay> = self.days.iter().collect();
        days.sort_by_key(|d| d.day_number);
        days
    }
}
