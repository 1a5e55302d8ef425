use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::catalog::Catalog;
use crate::models::quote::{
    DayDraft, GuideLine, HotelCost, PriceAdjustment, QuoteDraft, QuoteTotals, ServiceLine,
    TourPackageQuote,
};

pub const FORMAT_VERSION: u32 = 1;

/// Portable quote file. Catalog entries are referred to by name so a quote
/// can move between installations whose ids differ.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct QuoteExport {
    pub format_version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    pub quote: ExportedQuote,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportedQuote {
    /// Informational only; imports are always given a new reference.
    #[serde(default)]
    pub package_reference: Option<String>,
    pub name: String,
    pub customer_name: String,
    pub tour_pack_type: String,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub remark2: Option<String>,
    #[serde(default)]
    pub remark_of_hotels: Option<String>,
    #[serde(default)]
    pub commission_rate_hotel: Decimal,
    #[serde(default)]
    pub commission_rate_services: Decimal,
    pub days: Vec<ExportedDay>,
    #[serde(default)]
    pub hotel_costs: Vec<HotelCost>,
    #[serde(default)]
    pub discounts: Vec<PriceAdjustment>,
    #[serde(default)]
    pub extra_costs: Vec<PriceAdjustment>,
    #[serde(default)]
    pub totals: Option<QuoteTotals>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportedDay {
    pub date: NaiveDate,
    pub city: String,
    pub hotel: String,
    #[serde(default)]
    pub services: Vec<ExportedService>,
    #[serde(default)]
    pub guide_services: Vec<ExportedGuideService>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportedService {
    pub service: String,
    #[serde(default)]
    pub service_type: Option<String>,
    pub price_at_booking: Decimal,
    #[serde(default = "one")]
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExportedGuideService {
    pub guide_service: String,
    pub price_at_booking: Decimal,
}

fn one() -> u32 {
    1
}

fn missing(kind: &str, id: &ObjectId, quote: &TourPackageQuote) -> ApiError {
    ApiError::internal(format!(
        "quote {} references missing {} {}",
        quote.package_reference, kind, id
    ))
}

pub struct TransferService;

impl TransferService {
    pub fn export_quote(
        quote: &TourPackageQuote,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> ApiResult<QuoteExport> {
        let tour_pack_type = catalog
            .tour_pack_type(&quote.tour_pack_type_id)
            .ok_or_else(|| missing("tour pack type", &quote.tour_pack_type_id, quote))?
            .name
            .clone();

        let mut days = Vec::with_capacity(quote.days.len());
        for day in &quote.days {
            let city = catalog
                .city(&day.city_id)
                .ok_or_else(|| missing("city", &day.city_id, quote))?;
            let hotel = catalog
                .hotel(&day.hotel_id)
                .ok_or_else(|| missing("hotel", &day.hotel_id, quote))?;

            let services = day
                .services
                .iter()
                .map(|line| {
                    let service = catalog
                        .service(&line.service_id)
                        .ok_or_else(|| missing("service", &line.service_id, quote))?;
                    Ok(ExportedService {
                        service: service.name.clone(),
                        service_type: Some(catalog.service_type_name(service)),
                        price_at_booking: line.price_at_booking,
                        quantity: line.quantity,
                    })
                })
                .collect::<ApiResult<Vec<_>>>()?;

            let guide_services = day
                .guide_services
                .iter()
                .map(|line| {
                    let guide = catalog
                        .guide_service(&line.guide_service_id)
                        .ok_or_else(|| missing("guide service", &line.guide_service_id, quote))?;
                    Ok(ExportedGuideService {
                        guide_service: guide.name.clone(),
                        price_at_booking: line.price_at_booking,
                    })
                })
                .collect::<ApiResult<Vec<_>>>()?;

            days.push(ExportedDay {
                date: day.date,
                city: city.name.clone(),
                hotel: hotel.name.clone(),
                services,
                guide_services,
            });
        }

        Ok(QuoteExport {
            format_version: FORMAT_VERSION,
            exported_at: Some(now),
            quote: ExportedQuote {
                package_reference: Some(quote.package_reference.to_string()),
                name: quote.name.clone(),
                customer_name: quote.customer_name.clone(),
                tour_pack_type,
                remark: quote.remark.clone(),
                remark2: quote.remark2.clone(),
                remark_of_hotels: quote.remark_of_hotels.clone(),
                commission_rate_hotel: quote.commission_rate_hotel,
                commission_rate_services: quote.commission_rate_services,
                days,
                hotel_costs: quote.hotel_costs.clone(),
                discounts: quote.discounts.clone(),
                extra_costs: quote.extra_costs.clone(),
                totals: Some(quote.totals.clone()),
            },
        })
    }

    /// Resolves every name of an export against the local catalog. The
    /// draft still goes through quote validation before it is saved.
    pub fn import_quote(export: &QuoteExport, catalog: &Catalog) -> ApiResult<QuoteDraft> {
        if export.format_version != FORMAT_VERSION {
            return Err(ApiError::bad_request(format!(
                "Unsupported export format version {} (expected {}).",
                export.format_version, FORMAT_VERSION
            )));
        }

        let quote = &export.quote;
        let mut errors = FieldErrors::new();

        let tour_pack_type = catalog
            .find_tour_pack_type_by_name(&quote.tour_pack_type)
            .and_then(|t| t.id);
        if tour_pack_type.is_none() {
            errors.insert(
                "tour_pack_type".into(),
                format!("Unknown tour package type \"{}\".", quote.tour_pack_type),
            );
        }

        let mut days = Vec::with_capacity(quote.days.len());
        for (index, day) in quote.days.iter().enumerate() {
            let n = index + 1;

            let city_id = catalog.find_city_by_name(&day.city).and_then(|c| c.id);
            let Some(city_id) = city_id else {
                errors.insert(
                    format!("day{}_city", n),
                    format!("Unknown city \"{}\" for Day {}.", day.city, n),
                );
                continue;
            };

            let hotel_id = catalog.find_hotel_by_name(&city_id, &day.hotel).and_then(|h| h.id);
            if hotel_id.is_none() {
                errors.insert(
                    format!("day{}_hotel", n),
                    format!("Unknown hotel \"{}\" in {} for Day {}.", day.hotel, day.city, n),
                );
            }

            let mut services = Vec::with_capacity(day.services.len());
            for (s_index, line) in day.services.iter().enumerate() {
                match catalog.find_service_by_name(&city_id, &line.service).and_then(|s| s.id) {
                    Some(id) => services.push(ServiceLine {
                        service: id.to_hex(),
                        price_at_booking: Some(line.price_at_booking),
                        quantity: Some(line.quantity),
                    }),
                    None => {
                        errors.insert(
                            format!("day{}_service{}", n, s_index + 1),
                            format!("Unknown service \"{}\" in {} for Day {}.", line.service, day.city, n),
                        );
                    }
                }
            }

            let mut guide_services = Vec::with_capacity(day.guide_services.len());
            for (g_index, line) in day.guide_services.iter().enumerate() {
                match catalog.find_guide_service_by_name(&line.guide_service).and_then(|g| g.id) {
                    Some(id) => guide_services.push(GuideLine {
                        guide_service: id.to_hex(),
                        price_at_booking: Some(line.price_at_booking),
                    }),
                    None => {
                        errors.insert(
                            format!("day{}_guide_service{}", n, g_index + 1),
                            format!("Unknown guide service \"{}\" for Day {}.", line.guide_service, n),
                        );
                    }
                }
            }

            days.push(DayDraft {
                date: Some(day.date),
                city: Some(city_id.to_hex()),
                hotel: hotel_id.map(|id| id.to_hex()),
                services,
                guide_services,
            });
        }

        ApiError::check(errors)?;

        Ok(QuoteDraft {
            name: quote.name.clone(),
            customer_name: quote.customer_name.clone(),
            tour_pack_type: tour_pack_type.map(|id| id.to_hex()),
            remark: quote.remark.clone(),
            remark2: quote.remark2.clone(),
            remark_of_hotels: quote.remark_of_hotels.clone(),
            commission_rate_hotel: quote.commission_rate_hotel,
            commission_rate_services: quote.commission_rate_services,
            days,
            hotel_costs: quote.hotel_costs.clone(),
            discounts: quote.discounts.clone(),
            extra_costs: quote.extra_costs.clone(),
        })
    }
}
