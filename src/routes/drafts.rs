use actix_web::{web, HttpResponse};
use chrono::Utc;
use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::catalog::{self as store, load_catalog};
use crate::error::{ApiError, ApiResult};
use crate::models::extraction::ExtractedTrip;
use crate::models::predefined::PredefinedTourQuote;
use crate::models::quote::{DayDraft, QuoteDraft};
use crate::routes::parse_id;
use crate::services::itinerary_service::{DayEdit, ItineraryService};
use crate::services::matching_service::ItineraryMatcher;
use crate::services::pricing_service::PricingService;

#[derive(Debug, Deserialize)]
pub struct DayEditRequest {
    #[serde(default)]
    pub days: Vec<DayDraft>,
    pub edit: DayEdit,
}

#[derive(Debug, Serialize)]
pub struct DaysResponse {
    pub days: Vec<DayDraft>,
}

#[derive(Debug, Deserialize)]
pub struct HotelCostsRequest {
    #[serde(default)]
    pub days: Vec<DayDraft>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyTemplateRequest {
    #[serde(default)]
    pub draft: QuoteDraft,
    pub template_id: String,
    /// Falls back to the draft's own tour package type.
    #[serde(default)]
    pub tour_pack_type: Option<String>,
}

/// Live totals of the quote form.
pub async fn totals(input: web::Json<QuoteDraft>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(PricingService::calculate_draft_totals(&input)?))
}

pub async fn edit_days(input: web::Json<DayEditRequest>) -> ApiResult<HttpResponse> {
    let DayEditRequest { mut days, edit } = input.into_inner();
    ItineraryService::apply_edit(&mut days, &edit, Utc::now().date_naive())?;
    Ok(HttpResponse::Ok().json(DaysResponse { days }))
}

pub async fn hotel_costs(
    db: web::Data<Database>,
    input: web::Json<HotelCostsRequest>,
) -> ApiResult<HttpResponse> {
    let catalog = load_catalog(&db).await?;
    Ok(HttpResponse::Ok().json(ItineraryService::hotel_costs_from_days(&input.days, &catalog)))
}

pub async fn apply_template(
    db: web::Data<Database>,
    input: web::Json<ApplyTemplateRequest>,
) -> ApiResult<HttpResponse> {
    let ApplyTemplateRequest {
        mut draft,
        template_id,
        tour_pack_type,
    } = input.into_inner();

    let pack = tour_pack_type
        .or_else(|| draft.tour_pack_type.clone())
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| ApiError::invalid("tour_pack_type", "Tour package type is required."))?;
    let tour_pack_type_id = parse_id(pack.trim())?;
    let template_id = parse_id(&template_id)?;

    let template = store::get::<PredefinedTourQuote>(&db, &template_id).await?;
    let catalog = load_catalog(&db).await?;
    if catalog.tour_pack_type(&tour_pack_type_id).is_none() {
        return Err(ApiError::invalid("tour_pack_type", "Unknown tour package type."));
    }

    ItineraryService::apply_predefined(
        &mut draft,
        &template,
        &catalog,
        &tour_pack_type_id,
        Utc::now().date_naive(),
    )?;
    Ok(HttpResponse::Ok().json(draft))
}

/// Turns trip details read from a customer email into a draft for review.
pub async fn from_email(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    input: web::Json<ExtractedTrip>,
) -> ApiResult<HttpResponse> {
    let catalog = load_catalog(&db).await?;
    let matched = ItineraryMatcher::with_config(&catalog, config.matching.clone()).match_trip(&input);
    Ok(HttpResponse::Ok().json(matched))
}
