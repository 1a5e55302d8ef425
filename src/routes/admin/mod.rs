use actix_web::{web, Scope};

use crate::db::catalog::CatalogEntity;
use crate::models::catalog::{
    City, GuideService, Hotel, Service, ServicePrice, ServiceType, TourPackType,
};
use crate::models::predefined::PredefinedTourQuote;

pub mod backups;
pub mod catalog;

fn crud<T: CatalogEntity + 'static>(path: &str) -> Scope {
    web::scope(path)
        .service(
            web::resource("")
                .route(web::get().to(catalog::list::<T>))
                .route(web::post().to(catalog::create::<T>)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(catalog::get::<T>))
                .route(web::put().to(catalog::update::<T>))
                .route(web::delete().to(catalog::delete::<T>)),
        )
}

/// `/admin` without its guards; `routes::configure` wraps it.
pub fn scope() -> Scope {
    web::scope("/admin")
        .service(crud::<City>("/cities"))
        .service(crud::<Hotel>("/hotels"))
        .service(crud::<ServiceType>("/service-types"))
        .service(crud::<Service>("/services"))
        .service(crud::<ServicePrice>("/service-prices"))
        .service(crud::<GuideService>("/guide-services"))
        .service(crud::<TourPackType>("/tour-pack-types"))
        .service(crud::<PredefinedTourQuote>("/predefined-quotes"))
        .service(
            web::scope("/backups")
                .service(
                    web::resource("")
                        .route(web::get().to(backups::list))
                        .route(web::post().to(backups::upload)),
                )
                .route("/prune", web::post().to(backups::prune))
                .route("/{name}", web::get().to(backups::download))
                .route("/{name}/validate", web::get().to(backups::validate)),
        )
}
