use std::collections::{HashMap, HashSet};

use mongodb::bson::oid::ObjectId;

use crate::models::catalog::{Catalog, TourPackType};
use crate::models::extraction::{ExtractedTrip, MatchedDraft};
use crate::models::quote::{DayDraft, GuideLine, QuoteDraft, ServiceLine};

const MAX_SERVICES_PER_DAY: usize = 4;
const MIN_MATCH_SCORE: f32 = 0.5;
const MAX_TRIP_DAYS: usize = 90;

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub max_services_per_day: usize,
    /// Share of the requested name's tokens a catalog name must contain.
    pub min_score: f32,
    /// Longest itinerary the matcher builds; later nights are dropped.
    pub max_days: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_services_per_day: MAX_SERVICES_PER_DAY,
            min_score: MIN_MATCH_SCORE,
            max_days: MAX_TRIP_DAYS,
        }
    }
}

fn normalize(text: &str) -> String {
    tokens(text).join(" ")
}

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fraction of the requested tokens found in the candidate. An exact match
/// after normalisation scores 1.
fn token_score(requested: &str, candidate: &str) -> f32 {
    let wanted = tokens(requested);
    if wanted.is_empty() {
        return 0.0;
    }
    if normalize(requested) == normalize(candidate) {
        return 1.0;
    }
    let offered: HashSet<String> = tokens(candidate).into_iter().collect();
    let hits = wanted.iter().filter(|t| offered.contains(*t)).count();
    hits as f32 / wanted.len() as f32
}

fn leading_number(name: &str) -> Option<u32> {
    let digits: String = name.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Turns extracted trip parameters into a draft quote. Nothing here fails:
/// whatever cannot be matched is reported as a warning for staff to fix.
pub struct ItineraryMatcher<'a> {
    catalog: &'a Catalog,
    config: MatchingConfig,
}

impl<'a> ItineraryMatcher<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            config: MatchingConfig::default(),
        }
    }

    pub fn with_config(catalog: &'a Catalog, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }

    pub fn match_trip(&self, trip: &ExtractedTrip) -> MatchedDraft {
        let mut warnings = Vec::new();

        let pack = self.resolve_pack(trip, &mut warnings);
        let pack_id = pack.and_then(|p| p.id);

        let guides: Vec<GuideLine> = trip
            .guide_services
            .iter()
            .filter_map(|requested| {
                let found = self.best_match(
                    requested,
                    self.catalog.guide_services.iter().map(|g| (g.id, g.name.as_str())),
                );
                if found.is_none() {
                    warnings.push(format!("Guide service \"{}\" was not found.", requested));
                }
                found
            })
            .map(|id| GuideLine {
                guide_service: id.to_hex(),
                price_at_booking: self.catalog.guide_price(&id),
            })
            .collect();

        let mut days: Vec<DayDraft> = Vec::new();
        let mut hotel_by_city: HashMap<ObjectId, ObjectId> = HashMap::new();
        let mut date = Some(trip.start_date);

        for stop in &trip.stops {
            if date.is_none() {
                warnings.push(format!("No dates are left for {}; it was left out.", stop.city));
                continue;
            }
            let remaining = self.config.max_days.saturating_sub(days.len());
            if remaining == 0 {
                warnings.push(format!(
                    "Trips are limited to {} days; {} was left out.",
                    self.config.max_days, stop.city
                ));
                continue;
            }
            let wanted_nights = usize::try_from(stop.nights.max(1)).unwrap_or(usize::MAX);
            let nights = wanted_nights.min(remaining);
            if nights < wanted_nights {
                warnings.push(format!(
                    "Stay in {} was shortened to {} night(s); trips are limited to {} days.",
                    stop.city, nights, self.config.max_days
                ));
            }

            let first_day = days.len();
            let city_id = self.resolve_city(&stop.city);
            if city_id.is_none() {
                warnings.push(format!(
                    "City \"{}\" was not found; its days need a city and hotel.",
                    stop.city
                ));
            }

            let hotel_id = city_id.and_then(|city| {
                let hotel = self.resolve_hotel(city, stop.hotel.as_deref(), &hotel_by_city, &mut warnings);
                if let Some(hotel) = hotel {
                    hotel_by_city.insert(city, hotel);
                }
                hotel
            });

            for _ in 0..nights {
                let Some(day_date) = date else {
                    warnings.push(format!(
                        "No dates are left for the rest of the stay in {}.",
                        stop.city
                    ));
                    break;
                };
                days.push(DayDraft {
                    date: Some(day_date),
                    city: city_id.map(|c| c.to_hex()),
                    hotel: hotel_id.map(|h| h.to_hex()),
                    services: Vec::new(),
                    guide_services: guides.clone(),
                });
                date = day_date.succ_opt();
            }

            let Some(city) = city_id else { continue };
            let stop_days = &mut days[first_day..];
            for requested in &stop.services {
                let candidates = self
                    .catalog
                    .services_in_city(&city)
                    .into_iter()
                    .map(|s| (s.id, s.name.as_str()));
                let Some(service_id) = self.best_match(requested, candidates) else {
                    warnings.push(format!(
                        "Service \"{}\" is not offered in {}.",
                        requested, stop.city
                    ));
                    continue;
                };

                // fewest services first, earliest day on a tie
                let slot = stop_days
                    .iter_mut()
                    .filter(|d| d.services.len() < self.config.max_services_per_day)
                    .min_by_key(|d| d.services.len());
                match slot {
                    Some(day) => day.services.push(ServiceLine {
                        service: service_id.to_hex(),
                        price_at_booking: self.catalog.price_for(&service_id, pack_id.as_ref(), Some(&city)),
                        quantity: Some(1),
                    }),
                    None => warnings.push(format!(
                        "No room left in {} for \"{}\".",
                        stop.city, requested
                    )),
                }
            }
        }

        if trip.stops.is_empty() {
            warnings.push("No destinations were found in the request.".into());
        }

        log::info!(
            "Matched trip starting {} into {} day(s) with {} warning(s)",
            trip.start_date,
            days.len(),
            warnings.len()
        );

        MatchedDraft {
            draft: QuoteDraft {
                name: trip.tour_name.clone().unwrap_or_default(),
                customer_name: trip.customer_name.clone().unwrap_or_default(),
                tour_pack_type: pack_id.map(|id| id.to_hex()),
                days,
                ..Default::default()
            },
            warnings,
        }
    }

    /// An explicit tier name wins. Otherwise `{pax}pax`, then the largest
    /// tier not above the party size, then the first tier by name.
    fn resolve_pack(&self, trip: &ExtractedTrip, warnings: &mut Vec<String>) -> Option<&'a TourPackType> {
        if let Some(name) = trip.tour_pack_type.as_deref() {
            match self.catalog.find_tour_pack_type_by_name(name) {
                Some(pack) => return Some(pack),
                None => warnings.push(format!("Tour package type \"{}\" was not found.", name)),
            }
        }

        let mut packs: Vec<&'a TourPackType> = self.catalog.tour_pack_types.iter().collect();
        packs.sort_by(|a, b| a.name.cmp(&b.name));

        let by_pax = trip.pax.and_then(|pax| {
            self.catalog
                .find_tour_pack_type_by_name(&format!("{}pax", pax))
                .or_else(|| {
                    packs
                        .iter()
                        .filter_map(|p| leading_number(&p.name).map(|n| (n, *p)))
                        .filter(|(n, _)| *n <= pax)
                        .max_by_key(|(n, _)| *n)
                        .map(|(_, p)| p)
                })
        });

        let pack = by_pax.or_else(|| packs.first().copied());
        if pack.is_none() {
            warnings.push("No tour package types are configured.".into());
        }
        pack
    }

    fn resolve_city(&self, requested: &str) -> Option<ObjectId> {
        let wanted = normalize(requested);
        if wanted.is_empty() {
            return None;
        }
        let cities = &self.catalog.cities;
        cities
            .iter()
            .find(|c| normalize(&c.name) == wanted)
            .or_else(|| {
                cities.iter().find(|c| {
                    let name = normalize(&c.name);
                    !name.is_empty() && (name.contains(&wanted) || wanted.contains(&name))
                })
            })
            .and_then(|c| c.id)
    }

    fn resolve_hotel(
        &self,
        city: ObjectId,
        requested: Option<&str>,
        used: &HashMap<ObjectId, ObjectId>,
        warnings: &mut Vec<String>,
    ) -> Option<ObjectId> {
        let hotels = self.catalog.hotels_in_city(&city);

        if let Some(requested) = requested.filter(|r| !r.trim().is_empty()) {
            let found = self.best_match(requested, hotels.iter().map(|h| (h.id, h.name.as_str())));
            if found.is_some() {
                return found;
            }
            warnings.push(format!("Hotel \"{}\" was not found; another hotel was chosen.", requested));
        }

        let fallback = used.get(&city).copied().or_else(|| hotels.first().and_then(|h| h.id));
        if fallback.is_none() {
            let city_name = self.catalog.city(&city).map(|c| c.name.as_str()).unwrap_or_default();
            warnings.push(format!("No hotels are available in {}.", city_name));
        }
        fallback
    }

    /// Highest scoring candidate at or above the minimum score. Candidates
    /// are expected in display order; the first wins a tie.
    fn best_match<'n>(
        &self,
        requested: &str,
        candidates: impl Iterator<Item = (Option<ObjectId>, &'n str)>,
    ) -> Option<ObjectId> {
        let mut best: Option<(f32, ObjectId)> = None;
        for (id, name) in candidates {
            let Some(id) = id else { continue };
            let score = token_score(requested, name);
            if score < self.config.min_score {
                continue;
            }
            if best.map_or(true, |(top, _)| score > top) {
                best = Some((score, id));
            }
        }
        best.map(|(_, id)| id)
    }
}
