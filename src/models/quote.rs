use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::models::reference::PackageReference;

fn one() -> u32 {
    1
}

fn parse_money(raw: &str) -> Option<Decimal> {
    let raw = raw.trim().replace(',', "");
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
        .map(|amount| {
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        })
}

// Money arrives as numbers, numeric strings ("1,250.00") or blanks from the
// quote form; blanks count as zero. Amounts are kept to the cent.
pub(crate) fn deserialize_money<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_money(deserializer)?.unwrap_or_default())
}

pub(crate) fn deserialize_optional_money<'de, D>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => parse_money(&n.to_string())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {}", n))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => parse_money(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {}", s))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid amount: {}",
            other
        ))),
    }
}

// Room and night counts come in as integers or strings; decimals are
// truncated like the form's parseInt. Counts beyond u32 are rejected.
fn deserialize_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let truncate = |f: f64| -> Result<u32, D::Error> {
        if f.is_nan() || f <= 0.0 {
            Ok(0)
        } else if f.trunc() > f64::from(u32::MAX) {
            Err(serde::de::Error::custom(format!("count out of range: {}", f)))
        } else {
            Ok(f.trunc() as u32)
        }
    };

    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_u64() {
                u32::try_from(i)
                    .map_err(|_| serde::de::Error::custom(format!("count out of range: {}", i)))
            } else if let Some(f) = n.as_f64() {
                truncate(f)
            } else {
                Ok(0)
            }
        }
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().map_or(Ok(0), truncate),
        _ => Ok(0),
    }
}

fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid date {}: {}", s, e))),
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TourDayService {
    pub service_id: ObjectId,
    pub price_at_booking: Decimal,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TourDayGuideService {
    pub guide_service_id: ObjectId,
    pub price_at_booking: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TourDay {
    pub date: NaiveDate,
    pub city_id: ObjectId,
    pub hotel_id: ObjectId,
    #[serde(default)]
    pub services: Vec<TourDayService>,
    #[serde(default)]
    pub guide_services: Vec<TourDayGuideService>,
}

/// One hotel line of the quote: `rooms × nights × price + nights × extra_bed_price`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct HotelCost {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub room_type: String,
    #[serde(rename = "room", alias = "rooms", default = "one", deserialize_with = "deserialize_count")]
    pub rooms: u32,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub nights: u32,
    #[serde(default, deserialize_with = "deserialize_money")]
    pub price: Decimal,
    #[serde(
        rename = "extraBedPrice",
        alias = "extra_bed_price",
        default,
        deserialize_with = "deserialize_money"
    )]
    pub extra_bed_price: Decimal,
}

/// A discount or an extra cost line.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PriceAdjustment {
    #[serde(default)]
    pub item: String,
    #[serde(default, deserialize_with = "deserialize_money")]
    pub amount: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct QuoteTotals {
    pub service_total: Decimal,
    pub guide_service_total: Decimal,
    pub service_grand_total: Decimal,
    pub hotel_grand_total: Decimal,
    pub extra_costs_total: Decimal,
    pub discounts_total: Decimal,
    pub total_room_nights: u32,
    pub commission_amount_hotel: Decimal,
    pub commission_amount_services: Decimal,
    pub grand_total_cost: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TourPackageQuote {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub package_reference: PackageReference,
    pub name: String,
    pub customer_name: String,
    pub tour_pack_type_id: ObjectId,
    pub remark: Option<String>,
    pub remark2: Option<String>,
    pub remark_of_hotels: Option<String>,
    #[serde(default)]
    pub commission_rate_hotel: Decimal,
    #[serde(default)]
    pub commission_rate_services: Decimal,
    pub days: Vec<TourDay>,
    #[serde(default)]
    pub hotel_costs: Vec<HotelCost>,
    #[serde(default)]
    pub discounts: Vec<PriceAdjustment>,
    #[serde(default)]
    pub extra_costs: Vec<PriceAdjustment>,
    pub totals: QuoteTotals,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the quote list.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct QuoteSummary {
    pub package_reference: PackageReference,
    pub name: String,
    pub customer_name: String,
    pub tour_pack_type_id: String,
    pub days: usize,
    pub first_date: Option<NaiveDate>,
    pub grand_total_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&TourPackageQuote> for QuoteSummary {
    fn from(quote: &TourPackageQuote) -> Self {
        Self {
            package_reference: quote.package_reference,
            name: quote.name.clone(),
            customer_name: quote.customer_name.clone(),
            tour_pack_type_id: quote.tour_pack_type_id.to_hex(),
            days: quote.days.len(),
            first_date: quote.days.iter().map(|d| d.date).min(),
            grand_total_cost: quote.totals.grand_total_cost,
            created_at: quote.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServiceLine {
    #[serde(alias = "name")]
    pub service: String,
    #[serde(default, deserialize_with = "deserialize_optional_money")]
    pub price_at_booking: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GuideLine {
    #[serde(alias = "name")]
    pub guide_service: String,
    #[serde(default, deserialize_with = "deserialize_optional_money")]
    pub price_at_booking: Option<Decimal>,
}

/// A day as edited in the quote form; everything may still be missing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct DayDraft {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub hotel: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    #[serde(default, alias = "guideServices")]
    pub guide_services: Vec<GuideLine>,
}

/// Quote as submitted by the form, produced by imports and by the email
/// matcher. Ids are hex strings; prices are optional and resolved from the
/// catalog when absent.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct QuoteDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub tour_pack_type: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub remark2: Option<String>,
    #[serde(default)]
    pub remark_of_hotels: Option<String>,
    #[serde(default, deserialize_with = "deserialize_money")]
    pub commission_rate_hotel: Decimal,
    #[serde(default, deserialize_with = "deserialize_money")]
    pub commission_rate_services: Decimal,
    #[serde(default)]
    pub days: Vec<DayDraft>,
    #[serde(default, alias = "hotelCosts")]
    pub hotel_costs: Vec<HotelCost>,
    #[serde(default)]
    pub discounts: Vec<PriceAdjustment>,
    #[serde(default, alias = "extraCosts")]
    pub extra_costs: Vec<PriceAdjustment>,
}

impl From<&TourDay> for DayDraft {
    fn from(day: &TourDay) -> Self {
        Self {
            date: Some(day.date),
            city: Some(day.city_id.to_hex()),
            hotel: Some(day.hotel_id.to_hex()),
            services: day
                .services
                .iter()
                .map(|s| ServiceLine {
                    service: s.service_id.to_hex(),
                    price_at_booking: Some(s.price_at_booking),
                    quantity: Some(s.quantity),
                })
                .collect(),
            guide_services: day
                .guide_services
                .iter()
                .map(|g| GuideLine {
                    guide_service: g.guide_service_id.to_hex(),
                    price_at_booking: Some(g.price_at_booking),
                })
                .collect(),
        }
    }
}

impl From<&TourPackageQuote> for QuoteDraft {
    fn from(quote: &TourPackageQuote) -> Self {
        Self {
            name: quote.name.clone(),
            customer_name: quote.customer_name.clone(),
            tour_pack_type: Some(quote.tour_pack_type_id.to_hex()),
            remark: quote.remark.clone(),
            remark2: quote.remark2.clone(),
            remark_of_hotels: quote.remark_of_hotels.clone(),
            commission_rate_hotel: quote.commission_rate_hotel,
            commission_rate_services: quote.commission_rate_services,
            days: quote.days.iter().map(DayDraft::from).collect(),
            hotel_costs: quote.hotel_costs.clone(),
            discounts: quote.discounts.clone(),
            extra_costs: quote.extra_costs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::dec;
    use serde_json::json;

    #[test]
    fn test_draft_accepts_form_field_names() {
        let draft: QuoteDraft = serde_json::from_value(json!({
            "name": "Thailand Highlights",
            "customer_name": "Smith Family",
            "tour_pack_type": "65f000000000000000000001",
            "commission_rate_hotel": "2.50",
            "days": [{
                "date": "2026-03-01",
                "city": "65f000000000000000000002",
                "hotel": "65f000000000000000000003",
                "services": [{"name": "65f000000000000000000004", "price_at_booking": 80}],
                "guideServices": [{"name": "65f000000000000000000005", "price_at_booking": "40.00"}]
            }, {
                "date": "",
                "city": "",
                "hotel": ""
            }],
            "hotelCosts": [{
                "date": "",
                "name": "Siam Palace",
                "type": "Deluxe",
                "room": "2",
                "nights": 3,
                "price": "1,200.00",
                "extraBedPrice": ""
            }],
            "extraCosts": [{"item": "Visa", "amount": "35"}],
            "discounts": [{"item": "Loyalty", "amount": 10.5}]
        }))
        .unwrap();

        assert_eq!(draft.commission_rate_hotel, dec("2.5"));
        assert_eq!(draft.days.len(), 2);
        assert_eq!(draft.days[0].services[0].price_at_booking, Some(dec("80")));
        assert_eq!(draft.days[0].guide_services[0].price_at_booking, Some(dec("40")));
        assert_eq!(draft.days[1].date, None);

        let hotel = &draft.hotel_costs[0];
        assert_eq!(hotel.rooms, 2);
        assert_eq!(hotel.nights, 3);
        assert_eq!(hotel.price, dec("1200"));
        assert_eq!(hotel.extra_bed_price, Decimal::ZERO);
        assert_eq!(hotel.room_type, "Deluxe");

        assert_eq!(draft.extra_costs[0].amount, dec("35"));
        assert_eq!(draft.discounts[0].amount, dec("10.5"));
    }

    #[test]
    fn test_invalid_amount_is_rejected() {
        let result: Result<PriceAdjustment, _> =
            serde_json::from_value(json!({"item": "Visa", "amount": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_hotel_cost_defaults() {
        let cost: HotelCost = serde_json::from_value(json!({"name": "Mountain Lodge"})).unwrap();
        assert_eq!(cost.rooms, 1);
        assert_eq!(cost.nights, 0);
        assert_eq!(cost.price, Decimal::ZERO);
    }

    #[test]
    fn test_amounts_are_rounded_to_the_cent() {
        let cost: HotelCost = serde_json::from_value(json!({
            "name": "Siam Palace",
            "price": "0.005",
            "extraBedPrice": 12.344
        }))
        .unwrap();
        assert_eq!(cost.price, dec("0.01"));
        assert_eq!(cost.extra_bed_price, dec("12.34"));

        let line: ServiceLine =
            serde_json::from_value(json!({"service": "a", "price_at_booking": "-2.675"})).unwrap();
        assert_eq!(line.price_at_booking, Some(dec("-2.68")));
    }

    #[test]
    fn test_counts_beyond_u32_are_rejected() {
        for room in [json!(4294967297u64), json!("4294967297"), json!(5e12)] {
            let result: Result<HotelCost, _> =
                serde_json::from_value(json!({"name": "Siam Palace", "room": room}));
            assert!(result.is_err(), "{} accepted", room);
        }

        let cost: HotelCost =
            serde_json::from_value(json!({"room": 4294967295u64, "nights": "2.9"})).unwrap();
        assert_eq!(cost.rooms, u32::MAX);
        assert_eq!(cost.nights, 2);
    }
}
