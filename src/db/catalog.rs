use futures::TryStreamExt;
use mongodb::{bson::doc, bson::oid::ObjectId, Collection, Database};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;

use crate::error::{ApiError, ApiResult, FieldErrors};
use crate::models::catalog::{
    Catalog, City, GuideService, Hotel, Service, ServicePrice, ServiceType, TourPackType,
};
use crate::models::predefined::PredefinedTourQuote;

/// Admin-managed reference data stored one collection per type.
pub trait CatalogEntity: Serialize + DeserializeOwned + Unpin + Send + Sync + Sized {
    const COLLECTION: &'static str;
    /// Human readable name used in error messages.
    const LABEL: &'static str;
    const SORT_KEY: &'static str = "name";

    fn id(&self) -> Option<ObjectId>;
    fn set_id(&mut self, id: ObjectId);

    /// Field errors of this entry against the rest of the catalog.
    fn validate(&self, catalog: &Catalog) -> FieldErrors;

    /// Why the entry cannot be deleted, if something still refers to it.
    fn in_use(_id: &ObjectId, _catalog: &Catalog) -> Option<String> {
        None
    }
}

fn require_name(errors: &mut FieldErrors, name: &str) {
    if name.trim().is_empty() {
        errors.insert("name".into(), "Name is required.".into());
    }
}

fn require_price(errors: &mut FieldErrors, price: Decimal) {
    if price < Decimal::ZERO {
        errors.insert("price".into(), "Price cannot be negative.".into());
    }
}

fn unique_name<'a>(
    errors: &mut FieldErrors,
    own_id: Option<ObjectId>,
    name: &str,
    existing: impl Iterator<Item = (Option<ObjectId>, &'a str)>,
) {
    let taken = existing
        .filter(|(id, _)| id.is_none() || *id != own_id)
        .any(|(_, other)| other.trim().eq_ignore_ascii_case(name.trim()));
    if taken {
        errors.insert("name".into(), "This name is already in use.".into());
    }
}

impl CatalogEntity for City {
    const COLLECTION: &'static str = "Cities";
    const LABEL: &'static str = "City";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        unique_name(
            &mut errors,
            self.id,
            &self.name,
            catalog.cities.iter().map(|c| (c.id, c.name.as_str())),
        );
        errors
    }

    fn in_use(id: &ObjectId, catalog: &Catalog) -> Option<String> {
        if catalog.hotels.iter().any(|h| &h.city_id == id) {
            return Some("City still has hotels.".into());
        }
        if catalog.services.iter().any(|s| s.city_ids.contains(id)) {
            return Some("City is still offered by services.".into());
        }
        None
    }
}

impl CatalogEntity for Hotel {
    const COLLECTION: &'static str = "Hotels";
    const LABEL: &'static str = "Hotel";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        if catalog.city(&self.city_id).is_none() {
            errors.insert("city_id".into(), "Unknown city.".into());
        }
        errors
    }
}

impl CatalogEntity for ServiceType {
    const COLLECTION: &'static str = "ServiceTypes";
    const LABEL: &'static str = "Service type";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        unique_name(
            &mut errors,
            self.id,
            &self.name,
            catalog.service_types.iter().map(|t| (t.id, t.name.as_str())),
        );
        errors
    }

    fn in_use(id: &ObjectId, catalog: &Catalog) -> Option<String> {
        catalog
            .services
            .iter()
            .any(|s| &s.service_type_id == id)
            .then(|| "Service type is still used by services.".into())
    }
}

impl CatalogEntity for Service {
    const COLLECTION: &'static str = "Services";
    const LABEL: &'static str = "Service";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        require_price(&mut errors, self.price);
        if catalog.service_type(&self.service_type_id).is_none() {
            errors.insert("service_type_id".into(), "Unknown service type.".into());
        }
        if self.city_ids.is_empty() {
            errors.insert("city_ids".into(), "At least one city is required.".into());
        } else if self.city_ids.iter().any(|id| catalog.city(id).is_none()) {
            errors.insert("city_ids".into(), "Unknown city.".into());
        }
        errors
    }

    fn in_use(id: &ObjectId, catalog: &Catalog) -> Option<String> {
        catalog
            .service_prices
            .iter()
            .any(|p| &p.service_id == id)
            .then(|| "Service still has tier prices.".into())
    }
}

impl CatalogEntity for ServicePrice {
    const COLLECTION: &'static str = "ServicePrices";
    const LABEL: &'static str = "Service price";
    const SORT_KEY: &'static str = "_id";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_price(&mut errors, self.price);
        if catalog.service(&self.service_id).is_none() {
            errors.insert("service_id".into(), "Unknown service.".into());
        }
        if catalog.tour_pack_type(&self.tour_pack_type_id).is_none() {
            errors.insert("tour_pack_type_id".into(), "Unknown tour package type.".into());
        }
        if let Some(city_id) = &self.city_id {
            if catalog.city(city_id).is_none() {
                errors.insert("city_id".into(), "Unknown city.".into());
            } else if catalog.service(&self.service_id).is_some()
                && !catalog.service_offered_in(&self.service_id, city_id)
            {
                errors.insert("city_id".into(), "Service is not offered in this city.".into());
            }
        }
        errors
    }
}

impl CatalogEntity for GuideService {
    const COLLECTION: &'static str = "GuideServices";
    const LABEL: &'static str = "Guide service";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, _catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        require_price(&mut errors, self.price);
        errors
    }
}

impl CatalogEntity for TourPackType {
    const COLLECTION: &'static str = "TourPackTypes";
    const LABEL: &'static str = "Tour package type";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        unique_name(
            &mut errors,
            self.id,
            &self.name,
            catalog.tour_pack_types.iter().map(|t| (t.id, t.name.as_str())),
        );
        errors
    }

    fn in_use(id: &ObjectId, catalog: &Catalog) -> Option<String> {
        catalog
            .service_prices
            .iter()
            .any(|p| &p.tour_pack_type_id == id)
            .then(|| "Tour package type still has service prices.".into())
    }
}

impl CatalogEntity for PredefinedTourQuote {
    const COLLECTION: &'static str = "PredefinedQuotes";
    const LABEL: &'static str = "Predefined quote";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn validate(&self, catalog: &Catalog) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_name(&mut errors, &self.name);
        if let Some(pack) = &self.tour_pack_type_id {
            if catalog.tour_pack_type(pack).is_none() {
                errors.insert("tour_pack_type_id".into(), "Unknown tour package type.".into());
            }
        }

        let mut seen = HashSet::new();
        for day in &self.days {
            let n = day.day_number;
            if !seen.insert(n) {
                errors.insert(format!("day{}", n), format!("Day {} appears more than once.", n));
            }
            if catalog.city(&day.city_id).is_none() {
                errors.insert(format!("day{}_city", n), format!("Unknown city for Day {}.", n));
                continue;
            }
            if !catalog.hotel_in_city(&day.hotel_id, &day.city_id) {
                errors.insert(
                    format!("day{}_hotel", n),
                    format!("Hotel is not in the selected city for Day {}.", n),
                );
            }
            for (index, service) in day.services.iter().enumerate() {
                if !catalog.service_offered_in(&service.service_id, &day.city_id) {
                    errors.insert(
                        format!("day{}_service{}", n, index + 1),
                        format!("Service is not offered in the selected city for Day {}.", n),
                    );
                }
            }
            for (index, guide) in day.guide_service_ids.iter().enumerate() {
                if catalog.guide_service(guide).is_none() {
                    errors.insert(
                        format!("day{}_guide_service{}", n, index + 1),
                        format!("Unknown guide service for Day {}.", n),
                    );
                }
            }
        }
        errors
    }
}

fn collection<T: CatalogEntity>(db: &Database) -> Collection<T> {
    db.collection(T::COLLECTION)
}

fn not_found<T: CatalogEntity>(id: &ObjectId) -> ApiError {
    ApiError::not_found(format!("{} {}", T::LABEL, id))
}

pub async fn list<T: CatalogEntity>(db: &Database) -> ApiResult<Vec<T>> {
    let mut sort = doc! {};
    sort.insert(T::SORT_KEY, 1);
    let cursor = collection::<T>(db).find(doc! {}).sort(sort).await?;
    Ok(cursor.try_collect().await?)
}

pub async fn get<T: CatalogEntity>(db: &Database, id: &ObjectId) -> ApiResult<T> {
    collection::<T>(db)
        .find_one(doc! {"_id": id})
        .await?
        .ok_or_else(|| not_found::<T>(id))
}

pub async fn create<T: CatalogEntity>(db: &Database, mut item: T) -> ApiResult<T> {
    let catalog = load_catalog(db).await?;
    ApiError::check(item.validate(&catalog))?;

    let result = collection::<T>(db).insert_one(&item).await?;
    if let Some(id) = result.inserted_id.as_object_id() {
        item.set_id(id);
    }
    log::info!("Created {} {:?}", T::LABEL, item.id());
    Ok(item)
}

pub async fn replace<T: CatalogEntity>(db: &Database, id: &ObjectId, mut item: T) -> ApiResult<T> {
    item.set_id(*id);
    let catalog = load_catalog(db).await?;
    ApiError::check(item.validate(&catalog))?;

    let result = collection::<T>(db)
        .replace_one(doc! {"_id": id}, &item)
        .await?;
    if result.matched_count == 0 {
        return Err(not_found::<T>(id));
    }
    Ok(item)
}

pub async fn delete<T: CatalogEntity>(db: &Database, id: &ObjectId) -> ApiResult<()> {
    let catalog = load_catalog(db).await?;
    if let Some(reason) = T::in_use(id, &catalog) {
        return Err(ApiError::Conflict(reason));
    }

    let result = collection::<T>(db).delete_one(doc! {"_id": id}).await?;
    if result.deleted_count == 0 {
        return Err(not_found::<T>(id));
    }
    log::info!("Deleted {} {}", T::LABEL, id);
    Ok(())
}

/// Snapshot of all reference data used to validate and price quotes.
pub async fn load_catalog(db: &Database) -> ApiResult<Catalog> {
    let (cities, hotels, service_types, services, service_prices, guide_services, tour_pack_types) =
        futures::try_join!(
            list::<City>(db),
            list::<Hotel>(db),
            list::<ServiceType>(db),
            list::<Service>(db),
            list::<ServicePrice>(db),
            list::<GuideService>(db),
            list::<TourPackType>(db),
        )?;

    Ok(Catalog {
        cities,
        hotels,
        service_types,
        services,
        service_prices,
        guide_services,
        tour_pack_types,
    })
}
