use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct City {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Hotel {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub city_id: ObjectId,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServiceType {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
}

/// A bookable service. `price` is the base price used when no pax tier
/// price exists.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Service {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub service_type_id: ObjectId,
    #[serde(default)]
    pub city_ids: Vec<ObjectId>,
    #[serde(default)]
    pub price: Decimal,
}

/// Price of a service for a pax tier, optionally narrowed to one city.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServicePrice {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub service_id: ObjectId,
    pub tour_pack_type_id: ObjectId,
    #[serde(default)]
    pub city_id: Option<ObjectId>,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GuideService {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub price: Decimal,
}

/// Pricing tier such as "2pax".
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TourPackType {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct HotelOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ServiceOption {
    pub id: String,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ServiceTypeGroup {
    #[serde(rename = "type")]
    pub service_type: String,
    pub services: Vec<ServiceOption>,
}

/// What a city offers for one pax tier.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CityServices {
    pub hotels: Vec<HotelOption>,
    pub service_types: Vec<ServiceTypeGroup>,
}

/// In-memory snapshot of the whole catalog. Quote assembly, matching and
/// import all resolve ids and names against one of these.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub cities: Vec<City>,
    pub hotels: Vec<Hotel>,
    pub service_types: Vec<ServiceType>,
    pub services: Vec<Service>,
    pub service_prices: Vec<ServicePrice>,
    pub guide_services: Vec<GuideService>,
    pub tour_pack_types: Vec<TourPackType>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl Catalog {
    pub fn city(&self, id: &ObjectId) -> Option<&City> {
        self.cities.iter().find(|c| c.id.as_ref() == Some(id))
    }

    pub fn hotel(&self, id: &ObjectId) -> Option<&Hotel> {
        self.hotels.iter().find(|h| h.id.as_ref() == Some(id))
    }

    pub fn service_type(&self, id: &ObjectId) -> Option<&ServiceType> {
        self.service_types.iter().find(|t| t.id.as_ref() == Some(id))
    }

    pub fn service(&self, id: &ObjectId) -> Option<&Service> {
        self.services.iter().find(|s| s.id.as_ref() == Some(id))
    }

    pub fn guide_service(&self, id: &ObjectId) -> Option<&GuideService> {
        self.guide_services.iter().find(|g| g.id.as_ref() == Some(id))
    }

    pub fn tour_pack_type(&self, id: &ObjectId) -> Option<&TourPackType> {
        self.tour_pack_types.iter().find(|t| t.id.as_ref() == Some(id))
    }

    pub fn find_city_by_name(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| same_name(&c.name, name))
    }

    pub fn find_hotel_by_name(&self, city_id: &ObjectId, name: &str) -> Option<&Hotel> {
        self.hotels
            .iter()
            .find(|h| &h.city_id == city_id && same_name(&h.name, name))
    }

    pub fn find_service_by_name(&self, city_id: &ObjectId, name: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.city_ids.contains(city_id) && same_name(&s.name, name))
    }

    pub fn find_guide_service_by_name(&self, name: &str) -> Option<&GuideService> {
        self.guide_services.iter().find(|g| same_name(&g.name, name))
    }

    pub fn find_tour_pack_type_by_name(&self, name: &str) -> Option<&TourPackType> {
        self.tour_pack_types.iter().find(|t| same_name(&t.name, name))
    }

    pub fn hotels_in_city(&self, city_id: &ObjectId) -> Vec<&Hotel> {
        let mut hotels: Vec<&Hotel> = self.hotels.iter().filter(|h| &h.city_id == city_id).collect();
        hotels.sort_by(|a, b| a.name.cmp(&b.name));
        hotels
    }

    pub fn hotel_in_city(&self, hotel_id: &ObjectId, city_id: &ObjectId) -> bool {
        self.hotel(hotel_id).is_some_and(|h| &h.city_id == city_id)
    }

    pub fn service_offered_in(&self, service_id: &ObjectId, city_id: &ObjectId) -> bool {
        self.service(service_id)
            .is_some_and(|s| s.city_ids.contains(city_id))
    }

    pub fn services_in_city(&self, city_id: &ObjectId) -> Vec<&Service> {
        let mut services: Vec<&Service> = self
            .services
            .iter()
            .filter(|s| s.city_ids.contains(city_id))
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }

    pub fn service_type_name(&self, service: &Service) -> String {
        self.service_type(&service.service_type_id)
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    /// Resolves the price of a service for a pax tier. A city-specific tier
    /// price wins over a tier price without city; the service's base price
    /// is the last resort.
    pub fn price_for(
        &self,
        service_id: &ObjectId,
        tour_pack_type_id: Option<&ObjectId>,
        city_id: Option<&ObjectId>,
    ) -> Option<Decimal> {
        let service = self.service(service_id)?;

        if let Some(pack) = tour_pack_type_id {
            let tier_prices = self
                .service_prices
                .iter()
                .filter(|p| &p.service_id == service_id && &p.tour_pack_type_id == pack);

            let mut fallback = None;
            for price in tier_prices {
                match (&price.city_id, city_id) {
                    (Some(priced_city), Some(city)) if priced_city == city => {
                        return Some(price.price)
                    }
                    (None, _) if fallback.is_none() => fallback = Some(price.price),
                    _ => {}
                }
            }
            if fallback.is_some() {
                return fallback;
            }
        }

        Some(service.price)
    }

    pub fn guide_price(&self, guide_service_id: &ObjectId) -> Option<Decimal> {
        self.guide_service(guide_service_id).map(|g| g.price)
    }

    /// Hotels and services of a city grouped by service type, priced for
    /// the given tier.
    pub fn city_services(
        &self,
        city_id: &ObjectId,
        tour_pack_type_id: Option<&ObjectId>,
    ) -> CityServices {
        let hotels = self
            .hotels_in_city(city_id)
            .into_iter()
            .filter_map(|h| {
                h.id.map(|id| HotelOption {
                    id: id.to_hex(),
                    name: h.name.clone(),
                })
            })
            .collect();

        let mut groups: Vec<ServiceTypeGroup> = Vec::new();
        for service in self.services_in_city(city_id) {
            let Some(id) = service.id else { continue };
            let price = self
                .price_for(&id, tour_pack_type_id, Some(city_id))
                .unwrap_or(service.price);
            let option = ServiceOption {
                id: id.to_hex(),
                name: service.name.clone(),
                price,
            };

            let type_name = self.service_type_name(service);
            match groups.iter_mut().find(|g| g.service_type == type_name) {
                Some(group) => group.services.push(option),
                None => groups.push(ServiceTypeGroup {
                    service_type: type_name,
                    services: vec![option],
                }),
            }
        }
        groups.sort_by(|a, b| a.service_type.cmp(&b.service_type));

        CityServices {
            hotels,
            service_types: groups,
        }
    }
}
