//! Shared fixtures for unit tests.

use chrono::NaiveDate;
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;

use crate::models::catalog::{
    Catalog, City, GuideService, Hotel, Service, ServicePrice, ServiceType, TourPackType,
};

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("valid decimal literal")
}

pub fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid ISO date")
}

/// Catalog with two cities, three hotels, three services, two guide
/// services and two pax tiers, plus the ids needed to refer to them.
pub struct CatalogFixture {
    pub catalog: Catalog,
    pub bangkok: ObjectId,
    pub chiang_mai: ObjectId,
    pub siam_palace: ObjectId,
    pub riverside_inn: ObjectId,
    pub mountain_lodge: ObjectId,
    pub temple_tour: ObjectId,
    pub airport_transfer: ObjectId,
    pub doi_suthep_trek: ObjectId,
    pub english_guide: ObjectId,
    pub japanese_guide: ObjectId,
    pub pax2: ObjectId,
    pub pax4: ObjectId,
}

pub fn sample_catalog() -> CatalogFixture {
    let bangkok = ObjectId::new();
    let chiang_mai = ObjectId::new();
    let siam_palace = ObjectId::new();
    let riverside_inn = ObjectId::new();
    let mountain_lodge = ObjectId::new();
    let excursion = ObjectId::new();
    let transfer = ObjectId::new();
    let temple_tour = ObjectId::new();
    let airport_transfer = ObjectId::new();
    let doi_suthep_trek = ObjectId::new();
    let english_guide = ObjectId::new();
    let japanese_guide = ObjectId::new();
    let pax2 = ObjectId::new();
    let pax4 = ObjectId::new();

    let catalog = Catalog {
        cities: vec![
            City { id: Some(bangkok), name: "Bangkok".into() },
            City { id: Some(chiang_mai), name: "Chiang Mai".into() },
        ],
        hotels: vec![
            Hotel { id: Some(siam_palace), name: "Siam Palace".into(), city_id: bangkok },
            Hotel { id: Some(riverside_inn), name: "Riverside Inn".into(), city_id: bangkok },
            Hotel { id: Some(mountain_lodge), name: "Mountain Lodge".into(), city_id: chiang_mai },
        ],
        service_types: vec![
            ServiceType { id: Some(excursion), name: "Excursion".into() },
            ServiceType { id: Some(transfer), name: "Transfer".into() },
        ],
        services: vec![
            Service {
                id: Some(temple_tour),
                name: "Grand Palace Temple Tour".into(),
                service_type_id: excursion,
                city_ids: vec![bangkok],
                price: dec("60.00"),
            },
            Service {
                id: Some(airport_transfer),
                name: "Airport Transfer".into(),
                service_type_id: transfer,
                city_ids: vec![bangkok, chiang_mai],
                price: dec("25.00"),
            },
            Service {
                id: Some(doi_suthep_trek),
                name: "Doi Suthep Trek".into(),
                service_type_id: excursion,
                city_ids: vec![chiang_mai],
                price: dec("50.00"),
            },
        ],
        service_prices: vec![
            ServicePrice {
                id: Some(ObjectId::new()),
                service_id: temple_tour,
                tour_pack_type_id: pax2,
                city_id: None,
                price: dec("80.00"),
            },
            ServicePrice {
                id: Some(ObjectId::new()),
                service_id: airport_transfer,
                tour_pack_type_id: pax2,
                city_id: None,
                price: dec("30.00"),
            },
            ServicePrice {
                id: Some(ObjectId::new()),
                service_id: airport_transfer,
                tour_pack_type_id: pax2,
                city_id: Some(chiang_mai),
                price: dec("45.00"),
            },
        ],
        guide_services: vec![
            GuideService { id: Some(english_guide), name: "English Speaking Guide".into(), price: dec("40.00") },
            GuideService { id: Some(japanese_guide), name: "Japanese Speaking Guide".into(), price: dec("55.00") },
        ],
        tour_pack_types: vec![
            TourPackType { id: Some(pax2), name: "2pax".into() },
            TourPackType { id: Some(pax4), name: "4pax".into() },
        ],
    };

    CatalogFixture {
        catalog,
        bangkok,
        chiang_mai,
        siam_palace,
        riverside_inn,
        mountain_lodge,
        temple_tour,
        airport_transfer,
        doi_suthep_trek,
        english_guide,
        japanese_guide,
        pax2,
        pax4,
    }
}
