use actix_web::{web, HttpResponse};
use mongodb::Database;

use crate::db::catalog::{self as store, CatalogEntity};
use crate::error::ApiResult;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::routes::parse_id;

pub async fn list<T: CatalogEntity + 'static>(db: web::Data<Database>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(store::list::<T>(&db).await?))
}

pub async fn get<T: CatalogEntity + 'static>(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path.into_inner())?;
    Ok(HttpResponse::Ok().json(store::get::<T>(&db, &id).await?))
}

pub async fn create<T: CatalogEntity + 'static>(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    input: web::Json<T>,
) -> ApiResult<HttpResponse> {
    let item = store::create(&db, input.into_inner()).await?;
    log::info!("{} created {} {:?}", user.email, T::LABEL, item.id());
    Ok(HttpResponse::Created().json(item))
}

pub async fn update<T: CatalogEntity + 'static>(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<T>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path.into_inner())?;
    let item = store::replace(&db, &id, input.into_inner()).await?;
    log::info!("{} updated {} {}", user.email, T::LABEL, id);
    Ok(HttpResponse::Ok().json(item))
}

pub async fn delete<T: CatalogEntity + 'static>(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_id(&path.into_inner())?;
    store::delete::<T>(&db, &id).await?;
    log::info!("{} deleted {} {}", user.email, T::LABEL, id);
    Ok(HttpResponse::NoContent().finish())
}
