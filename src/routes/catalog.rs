use actix_web::{web, HttpResponse};
use mongodb::Database;
use serde::Deserialize;

use crate::db::catalog::{self as store, load_catalog};
use crate::error::{ApiError, ApiResult};
use crate::models::catalog::{City, GuideService, TourPackType};
use crate::models::predefined::PredefinedTourQuote;
use crate::routes::parse_id;

#[derive(Deserialize)]
pub struct CityServicesQuery {
    tour_pack_type: Option<String>,
}

pub async fn list_cities(db: web::Data<Database>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(store::list::<City>(&db).await?))
}

pub async fn list_guide_services(db: web::Data<Database>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(store::list::<GuideService>(&db).await?))
}

pub async fn list_tour_pack_types(db: web::Data<Database>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(store::list::<TourPackType>(&db).await?))
}

pub async fn list_predefined_quotes(db: web::Data<Database>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(store::list::<PredefinedTourQuote>(&db).await?))
}

/// Hotels and services of a city for the day editor, priced for the
/// selected tour package type when one is given.
pub async fn city_services(
    db: web::Data<Database>,
    path: web::Path<String>,
    params: web::Query<CityServicesQuery>,
) -> ApiResult<HttpResponse> {
    let city_id = parse_id(&path.into_inner())?;
    let tour_pack_type_id = match params.tour_pack_type.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw)?),
        _ => None,
    };

    let catalog = load_catalog(&db).await?;
    if catalog.city(&city_id).is_none() {
        return Err(ApiError::not_found(format!("City {}", city_id)));
    }

    Ok(HttpResponse::Ok().json(catalog.city_services(&city_id, tour_pack_type_id.as_ref())))
}
