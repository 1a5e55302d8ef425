use actix_web::{web, HttpResponse};
use chrono::{Datelike, Utc};
use mongodb::Database;
use serde::Deserialize;

use crate::db::{catalog::load_catalog, quotes, references};
use crate::error::ApiResult;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::quote::{QuoteDraft, QuoteSummary};
use crate::routes::{attachment, parse_reference};
use crate::services::quote_service::QuoteService;
use crate::services::supplier_sheet::build_supplier_sheet;
use crate::services::transfer_service::{QuoteExport, TransferService};

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Deserialize)]
pub struct ListParams {
    q: Option<String>,
}

pub async fn list(db: web::Data<Database>, params: web::Query<ListParams>) -> ApiResult<HttpResponse> {
    let summaries: Vec<QuoteSummary> = quotes::list(&db, params.q.as_deref())
        .await?
        .iter()
        .map(QuoteSummary::from)
        .collect();
    Ok(HttpResponse::Ok().json(summaries))
}

pub async fn create(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    input: web::Json<QuoteDraft>,
) -> ApiResult<HttpResponse> {
    let draft = input.into_inner();
    let catalog = load_catalog(&db).await?;

    // Validate before a reference number is spent on the quote.
    QuoteService::validate(&draft, &catalog)?;
    let now = Utc::now();
    let reference = references::next_reference(&db, now.year()).await?;

    let quote = QuoteService::assemble(&draft, &catalog, reference, None, now)?;
    let quote = quotes::insert(&db, quote).await?;
    log::info!("{} created quote {}", user.email, quote.package_reference);

    Ok(HttpResponse::Created().json(quote))
}

pub async fn get(db: web::Data<Database>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(quotes::find_by_reference(&db, &reference).await?))
}

pub async fn update(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<QuoteDraft>,
) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    let existing = quotes::find_by_reference(&db, &reference).await?;
    let catalog = load_catalog(&db).await?;

    let quote = QuoteService::assemble(
        &input.into_inner(),
        &catalog,
        reference,
        Some(&existing),
        Utc::now(),
    )?;
    quotes::replace(&db, &quote).await?;
    log::info!("{} updated quote {}", user.email, reference);

    Ok(HttpResponse::Ok().json(quote))
}

pub async fn delete(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    quotes::delete(&db, &reference).await?;
    log::info!("{} deleted quote {}", user.email, reference);
    Ok(HttpResponse::NoContent().finish())
}

pub async fn duplicate(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    let original = quotes::find_by_reference(&db, &reference).await?;

    let now = Utc::now();
    let new_reference = references::next_reference(&db, now.year()).await?;
    let copy = quotes::insert(&db, QuoteService::duplicate(&original, new_reference, now)).await?;
    log::info!("{} duplicated quote {} as {}", user.email, reference, new_reference);

    Ok(HttpResponse::Created().json(copy))
}

pub async fn export(db: web::Data<Database>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    let quote = quotes::find_by_reference(&db, &reference).await?;
    let catalog = load_catalog(&db).await?;

    let export = TransferService::export_quote(&quote, &catalog, Utc::now())?;
    Ok(HttpResponse::Ok()
        .insert_header(attachment(format!("quote-{}.json", reference)))
        .json(export))
}

/// Imports always get a fresh reference, whatever the file carried.
pub async fn import(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    input: web::Json<QuoteExport>,
) -> ApiResult<HttpResponse> {
    let catalog = load_catalog(&db).await?;
    let draft = TransferService::import_quote(&input, &catalog)?;
    QuoteService::validate(&draft, &catalog)?;

    let now = Utc::now();
    let reference = references::next_reference(&db, now.year()).await?;
    let quote = QuoteService::assemble(&draft, &catalog, reference, None, now)?;
    let quote = quotes::insert(&db, quote).await?;
    log::info!("{} imported quote {}", user.email, quote.package_reference);

    Ok(HttpResponse::Created().json(quote))
}

pub async fn supplier_sheet(db: web::Data<Database>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    let quote = quotes::find_by_reference(&db, &reference).await?;
    let catalog = load_catalog(&db).await?;

    let workbook = build_supplier_sheet(&quote, &catalog)?;
    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(attachment(format!("supplier-{}.xlsx", reference)))
        .body(workbook))
}
