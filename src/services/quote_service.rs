use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;

use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::catalog::Catalog;
use crate::models::quote::{
    QuoteDraft, TourDay, TourDayGuideService, TourDayService, TourPackageQuote,
};
use crate::models::reference::PackageReference;
use crate::services::pricing_service::{PricingInput, PricingService};

const COPY_SUFFIX: &str = " (Copy)";

enum IdField {
    Missing,
    Invalid,
    Valid(ObjectId),
}

fn parse_id(raw: Option<&String>) -> IdField {
    match raw.map(|s| s.trim()) {
        None | Some("") => IdField::Missing,
        Some(s) => ObjectId::parse_str(s).map_or(IdField::Invalid, IdField::Valid),
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// A draft that passed validation, with every price-at-booking resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDraft {
    pub tour_pack_type_id: ObjectId,
    pub days: Vec<TourDay>,
}

pub struct QuoteService;

impl QuoteService {
    /// Validates a draft against the catalog and resolves its days. Every
    /// problem is reported, keyed by field, before anything is returned.
    ///
    /// Prices sent with the draft are kept as the price-at-booking so a
    /// later catalog change never reprices a saved quote; absent prices are
    /// resolved for the draft's pax tier and the day's city.
    pub fn validate(draft: &QuoteDraft, catalog: &Catalog) -> ApiResult<ValidatedDraft> {
        let mut errors = FieldErrors::new();

        if is_blank(&draft.name) {
            errors.insert("name".into(), "Package name is required.".into());
        }
        if is_blank(&draft.customer_name) {
            errors.insert("customer_name".into(), "Customer name is required.".into());
        }

        let tour_pack_type_id = match parse_id(draft.tour_pack_type.as_ref()) {
            IdField::Valid(id) if catalog.tour_pack_type(&id).is_some() => Some(id),
            IdField::Missing => {
                errors.insert("tour_pack_type".into(), "Tour package type is required.".into());
                None
            }
            _ => {
                errors.insert("tour_pack_type".into(), "Unknown tour package type.".into());
                None
            }
        };

        if draft.days.is_empty() {
            errors.insert("days".into(), "At least one day is required.".into());
        }

        for (field, rate) in [
            ("commission_rate_hotel", draft.commission_rate_hotel),
            ("commission_rate_services", draft.commission_rate_services),
        ] {
            if rate.is_sign_negative() && !rate.is_zero() {
                errors.insert(field.into(), "Commission rate cannot be negative.".into());
            }
        }
        for (index, cost) in draft.hotel_costs.iter().enumerate() {
            if cost.price < Decimal::ZERO || cost.extra_bed_price < Decimal::ZERO {
                errors.insert(
                    format!("hotel_cost{}", index + 1),
                    "Hotel prices cannot be negative.".into(),
                );
            }
        }
        for (prefix, lines) in [("discount", &draft.discounts), ("extra_cost", &draft.extra_costs)] {
            for (index, line) in lines.iter().enumerate() {
                if line.amount < Decimal::ZERO {
                    errors.insert(
                        format!("{}{}", prefix, index + 1),
                        "Amount cannot be negative.".into(),
                    );
                }
            }
        }

        let mut days = Vec::with_capacity(draft.days.len());
        for (index, day) in draft.days.iter().enumerate() {
            let n = index + 1;

            if day.date.is_none() {
                errors.insert(format!("day{}_date", n), format!("Date is required for Day {}.", n));
            }

            let city_id = match parse_id(day.city.as_ref()) {
                IdField::Valid(id) if catalog.city(&id).is_some() => Some(id),
                IdField::Missing => {
                    errors.insert(format!("day{}_city", n), format!("City is required for Day {}.", n));
                    None
                }
                _ => {
                    errors.insert(format!("day{}_city", n), format!("Unknown city for Day {}.", n));
                    None
                }
            };

            let hotel_id = match parse_id(day.hotel.as_ref()) {
                IdField::Valid(id) => match city_id {
                    Some(city) if !catalog.hotel_in_city(&id, &city) => {
                        errors.insert(
                            format!("day{}_hotel", n),
                            format!("Hotel is not in the selected city for Day {}.", n),
                        );
                        None
                    }
                    _ => Some(id),
                },
                IdField::Missing => {
                    errors.insert(format!("day{}_hotel", n), format!("Hotel is required for Day {}.", n));
                    None
                }
                IdField::Invalid => {
                    errors.insert(format!("day{}_hotel", n), format!("Unknown hotel for Day {}.", n));
                    None
                }
            };

            let mut services = Vec::with_capacity(day.services.len());
            for (s_index, line) in day.services.iter().enumerate() {
                let key = format!("day{}_service{}", n, s_index + 1);
                let service_id = match ObjectId::parse_str(line.service.trim()) {
                    Ok(id) if catalog.service(&id).is_some() => id,
                    _ => {
                        errors.insert(key, format!("Unknown service for Day {}.", n));
                        continue;
                    }
                };
                if let Some(city) = city_id {
                    if !catalog.service_offered_in(&service_id, &city) {
                        errors.insert(
                            key,
                            format!("Service is not offered in the selected city for Day {}.", n),
                        );
                        continue;
                    }
                }

                let price = line.price_at_booking.or_else(|| {
                    catalog.price_for(&service_id, tour_pack_type_id.as_ref(), city_id.as_ref())
                });
                match price {
                    Some(price) if price >= Decimal::ZERO => services.push(TourDayService {
                        service_id,
                        price_at_booking: price,
                        quantity: line.quantity.unwrap_or(1).max(1),
                    }),
                    _ => {
                        errors.insert(key, format!("Service price cannot be negative for Day {}.", n));
                    }
                }
            }

            let mut guide_services = Vec::with_capacity(day.guide_services.len());
            for (g_index, line) in day.guide_services.iter().enumerate() {
                let key = format!("day{}_guide_service{}", n, g_index + 1);
                let guide_id = match ObjectId::parse_str(line.guide_service.trim()) {
                    Ok(id) if catalog.guide_service(&id).is_some() => id,
                    _ => {
                        errors.insert(key, format!("Unknown guide service for Day {}.", n));
                        continue;
                    }
                };
                match line.price_at_booking.or_else(|| catalog.guide_price(&guide_id)) {
                    Some(price) if price >= Decimal::ZERO => guide_services.push(TourDayGuideService {
                        guide_service_id: guide_id,
                        price_at_booking: price,
                    }),
                    _ => {
                        errors.insert(
                            key,
                            format!("Guide service price cannot be negative for Day {}.", n),
                        );
                    }
                }
            }

            if let (Some(date), Some(city_id), Some(hotel_id)) = (day.date, city_id, hotel_id) {
                days.push(TourDay {
                    date,
                    city_id,
                    hotel_id,
                    services,
                    guide_services,
                });
            }
        }

        ApiError::check(errors)?;
        let tour_pack_type_id = tour_pack_type_id
            .ok_or_else(|| ApiError::internal("tour pack type missing after validation"))?;

        Ok(ValidatedDraft {
            tour_pack_type_id,
            days,
        })
    }

    /// Builds the stored document for a draft. When `existing` is given the
    /// quote keeps its id, reference and creation time and its days are
    /// replaced wholesale.
    pub fn assemble(
        draft: &QuoteDraft,
        catalog: &Catalog,
        reference: PackageReference,
        existing: Option<&TourPackageQuote>,
        now: DateTime<Utc>,
    ) -> ApiResult<TourPackageQuote> {
        let validated = Self::validate(draft, catalog)?;

        let totals = PricingService::calculate_totals(
            &validated.days,
            PricingInput {
                hotel_costs: &draft.hotel_costs,
                discounts: &draft.discounts,
                extra_costs: &draft.extra_costs,
                commission_rate_hotel: draft.commission_rate_hotel,
                commission_rate_services: draft.commission_rate_services,
            },
        )?;

        Ok(TourPackageQuote {
            id: existing.and_then(|q| q.id),
            package_reference: existing.map_or(reference, |q| q.package_reference),
            name: draft.name.trim().to_string(),
            customer_name: draft.customer_name.trim().to_string(),
            tour_pack_type_id: validated.tour_pack_type_id,
            remark: clean(&draft.remark),
            remark2: clean(&draft.remark2),
            remark_of_hotels: clean(&draft.remark_of_hotels),
            commission_rate_hotel: draft.commission_rate_hotel,
            commission_rate_services: draft.commission_rate_services,
            days: validated.days,
            hotel_costs: draft.hotel_costs.clone(),
            discounts: draft.discounts.clone(),
            extra_costs: draft.extra_costs.clone(),
            totals,
            created_at: existing.map_or(now, |q| q.created_at),
            updated_at: now,
        })
    }

    /// Copy of a quote under a new reference. Prices-at-booking are copied
    /// as they are.
    pub fn duplicate(
        quote: &TourPackageQuote,
        reference: PackageReference,
        now: DateTime<Utc>,
    ) -> TourPackageQuote {
        TourPackageQuote {
            id: None,
            package_reference: reference,
            name: format!("{}{}", quote.name, COPY_SUFFIX),
            created_at: now,
            updated_at: now,
            ..quote.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quote::{DayDraft, GuideLine, HotelCost, PriceAdjustment, ServiceLine};
    use crate::test_utils::{date, dec, sample_catalog, CatalogFixture};

    fn valid_draft(fx: &CatalogFixture) -> QuoteDraft {
        QuoteDraft {
            name: "Thailand Highlights".into(),
            customer_name: "Smith Family".into(),
            tour_pack_type: Some(fx.pax2.to_hex()),
            days: vec![
                DayDraft {
                    date: Some(date("2026-03-01")),
                    city: Some(fx.bangkok.to_hex()),
                    hotel: Some(fx.siam_palace.to_hex()),
                    services: vec![
                        ServiceLine {
                            service: fx.airport_transfer.to_hex(),
                            price_at_booking: None,
                            quantity: None,
                        },
                        ServiceLine {
                            service: fx.temple_tour.to_hex(),
                            price_at_booking: Some(dec("75.00")),
                            quantity: Some(2),
                        },
                    ],
                    guide_services: vec![GuideLine {
                        guide_service: fx.english_guide.to_hex(),
                        price_at_booking: None,
                    }],
                },
                DayDraft {
                    date: Some(date("2026-03-02")),
                    city: Some(fx.chiang_mai.to_hex()),
                    hotel: Some(fx.mountain_lodge.to_hex()),
                    services: vec![ServiceLine {
                        service: fx.airport_transfer.to_hex(),
                        price_at_booking: None,
                        quantity: None,
                    }],
                    guide_services: vec![],
                },
            ],
            hotel_costs: vec![HotelCost {
                name: "Siam Palace".into(),
                rooms: 1,
                nights: 1,
                price: dec("100"),
                ..Default::default()
            }],
            extra_costs: vec![PriceAdjustment {
                item: "Visa".into(),
                amount: dec("35"),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_draft_resolves_prices() {
        let fx = sample_catalog();
        let validated = QuoteService::validate(&valid_draft(&fx), &fx.catalog).unwrap();

        assert_eq!(validated.tour_pack_type_id, fx.pax2);
        assert_eq!(validated.days.len(), 2);

        let first = &validated.days[0];
        assert_eq!(first.services[0].price_at_booking, dec("30.00"));
        // price sent with the draft is kept
        assert_eq!(first.services[1].price_at_booking, dec("75.00"));
        assert_eq!(first.services[1].quantity, 2);
        assert_eq!(first.guide_services[0].price_at_booking, dec("40.00"));

        // city-specific tier price
        assert_eq!(validated.days[1].services[0].price_at_booking, dec("45.00"));
    }

    #[test]
    fn test_build_computes_totals() {
        let fx = sample_catalog();
        let now = Utc::now();
        let quote = QuoteService::assemble(
            &valid_draft(&fx),
            &fx.catalog,
            PackageReference::new(2026, 1),
            None,
            now,
        )
        .unwrap();

        // 30 + 75*2 + 45 services, 40 guide, 100 hotel, 35 extra
        assert_eq!(quote.totals.service_total, dec("225.00"));
        assert_eq!(quote.totals.guide_service_total, dec("40.00"));
        assert_eq!(quote.totals.hotel_grand_total, dec("100.00"));
        assert_eq!(quote.totals.grand_total_cost, dec("400.00"));
        assert_eq!(quote.package_reference.to_string(), "2026-0001");
        assert_eq!(quote.created_at, now);
    }

    #[test]
    fn test_rebuild_keeps_identity() {
        let fx = sample_catalog();
        let created = Utc::now() - chrono::Duration::days(3);
        let mut original = QuoteService::assemble(
            &valid_draft(&fx),
            &fx.catalog,
            PackageReference::new(2026, 5),
            None,
            created,
        )
        .unwrap();
        original.id = Some(ObjectId::new());

        let mut draft = valid_draft(&fx);
        draft.days.truncate(1);
        draft.name = "Bangkok Only".into();

        let now = Utc::now();
        let updated = QuoteService::assemble(
            &draft,
            &fx.catalog,
            PackageReference::new(2026, 99),
            Some(&original),
            now,
        )
        .unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.package_reference, original.package_reference);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, now);
        assert_eq!(updated.days.len(), 1);
        assert_eq!(updated.name, "Bangkok Only");
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let fx = sample_catalog();
        let draft = QuoteDraft {
            days: vec![DayDraft::default()],
            ..Default::default()
        };

        match QuoteService::validate(&draft, &fx.catalog) {
            Err(ApiError::Validation(errors)) => {
                for key in ["name", "customer_name", "tour_pack_type", "day1_date", "day1_city", "day1_hotel"] {
                    assert!(errors.contains_key(key), "missing {}", key);
                }
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_days_rejected() {
        let fx = sample_catalog();
        let mut draft = valid_draft(&fx);
        draft.days.clear();

        match QuoteService::validate(&draft, &fx.catalog) {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors.get("days").unwrap(), "At least one day is required.");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_service_must_be_offered_in_city() {
        let fx = sample_catalog();
        let mut draft = valid_draft(&fx);
        draft.days[1].services.push(ServiceLine {
            service: fx.temple_tour.to_hex(),
            price_at_booking: None,
            quantity: None,
        });

        match QuoteService::validate(&draft, &fx.catalog) {
            Err(ApiError::Validation(errors)) => {
                assert!(errors.contains_key("day2_service2"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_hotel_must_be_in_city() {
        let fx = sample_catalog();
        let mut draft = valid_draft(&fx);
        draft.days[1].hotel = Some(fx.siam_palace.to_hex());

        match QuoteService::validate(&draft, &fx.catalog) {
            Err(ApiError::Validation(errors)) => assert!(errors.contains_key("day2_hotel")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_ids_rejected() {
        let fx = sample_catalog();
        let mut draft = valid_draft(&fx);
        draft.tour_pack_type = Some("not-an-id".into());
        draft.days[0].guide_services.push(GuideLine {
            guide_service: ObjectId::new().to_hex(),
            price_at_booking: None,
        });

        match QuoteService::validate(&draft, &fx.catalog) {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors.get("tour_pack_type").unwrap(), "Unknown tour package type.");
                assert!(errors.contains_key("day1_guide_service2"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let fx = sample_catalog();
        let mut draft = valid_draft(&fx);
        draft.discounts.push(PriceAdjustment {
            item: "Oops".into(),
            amount: dec("-5"),
        });
        draft.commission_rate_services = dec("-1");

        match QuoteService::validate(&draft, &fx.catalog) {
            Err(ApiError::Validation(errors)) => {
                assert!(errors.contains_key("discount1"));
                assert!(errors.contains_key("commission_rate_services"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate() {
        let fx = sample_catalog();
        let mut quote = QuoteService::assemble(
            &valid_draft(&fx),
            &fx.catalog,
            PackageReference::new(2026, 1),
            None,
            Utc::now(),
        )
        .unwrap();
        quote.id = Some(ObjectId::new());

        let copy = QuoteService::duplicate(&quote, PackageReference::new(2026, 2), Utc::now());
        assert_eq!(copy.id, None);
        assert_eq!(copy.name, "Thailand Highlights (Copy)");
        assert_eq!(copy.package_reference.to_string(), "2026-0002");
        assert_eq!(copy.days, quote.days);
        assert_eq!(copy.totals, quote.totals);
    }
}
