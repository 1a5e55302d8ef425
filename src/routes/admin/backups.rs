use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::TryStreamExt;
use serde_json::json;

use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth_context::AuthenticatedUser;
use crate::routes::attachment;
use crate::services::backup_service;

const UPLOAD_FIELD: &str = "backup_file";

pub async fn list(config: web::Data<AppConfig>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(backup_service::list_backups(&config.backup_dir).await?))
}

/// Stores the `backup_file` part of a multipart form. Other parts are
/// ignored.
pub async fn upload(
    config: web::Data<AppConfig>,
    user: AuthenticatedUser,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let multipart_error = |e: actix_multipart::MultipartError| ApiError::bad_request(e.to_string());

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string)
            .ok_or_else(|| ApiError::invalid(UPLOAD_FIELD, "No file was uploaded."))?;

        let mut bytes = web::BytesMut::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            bytes.extend_from_slice(&chunk);
        }

        let stored = backup_service::store_upload(&config.backup_dir, &file_name, &bytes).await?;
        log::info!("{} uploaded backup {}", user.email, stored);
        return Ok(HttpResponse::Created().json(json!({
            "status": "success",
            "file_name": stored,
        })));
    }

    Err(ApiError::invalid(UPLOAD_FIELD, "No file was uploaded."))
}

pub async fn download(
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = path.into_inner();
    let bytes = backup_service::read_backup(&config.backup_dir, &name).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header(attachment(name))
        .body(bytes))
}

pub async fn validate(
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let check = backup_service::validate_backup(&config.backup_dir, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(check))
}

/// Keeps the newest `backup_retention` files.
pub async fn prune(
    config: web::Data<AppConfig>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let report = backup_service::prune_backups(&config.backup_dir, config.backup_retention).await?;
    log::info!(
        "{} pruned backups: {} deleted, {} failed",
        user.email,
        report.deleted.len(),
        report.failed.len()
    );
    Ok(HttpResponse::Ok().json(report))
}
