use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest};
use mongodb::bson::oid::ObjectId;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::UserRole;
use crate::models::reference::PackageReference;

pub mod account;
pub mod admin;
pub mod catalog;
pub mod drafts;
pub mod health;
pub mod quotes;

const JSON_LIMIT: usize = 1 << 20;

pub(crate) fn parse_id(raw: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid id '{}'.", raw)))
}

pub(crate) fn parse_reference(raw: &str) -> ApiResult<PackageReference> {
    raw.parse::<PackageReference>()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

pub(crate) fn attachment(file_name: String) -> ContentDisposition {
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(file_name)],
    }
}

fn json_error(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::bad_request(err.to_string()).into()
}

/// Registers every route. The caller provides `web::Data<AppConfig>` and
/// `web::Data<mongodb::Database>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(json_error),
    )
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/api")
            .route("/auth/signin", web::post().to(account::signin))
            // Admin routes; RequireRole runs after AuthMiddleware
            .service(
                admin::scope()
                    .wrap(RequireRole::new(UserRole::Admin))
                    .wrap(AuthMiddleware),
            )
            // Staff routes
            .service(
                web::scope("")
                    .wrap(AuthMiddleware)
                    .route("/auth/session", web::get().to(account::session))
                    .service(
                        web::scope("/catalog")
                            .route("/cities", web::get().to(catalog::list_cities))
                            .route(
                                "/cities/{id}/services",
                                web::get().to(catalog::city_services),
                            )
                            .route(
                                "/guide-services",
                                web::get().to(catalog::list_guide_services),
                            )
                            .route(
                                "/tour-pack-types",
                                web::get().to(catalog::list_tour_pack_types),
                            ),
                    )
                    .route(
                        "/predefined-quotes",
                        web::get().to(catalog::list_predefined_quotes),
                    )
                    .service(
                        web::scope("/quotes")
                            .service(
                                web::resource("")
                                    .route(web::get().to(quotes::list))
                                    .route(web::post().to(quotes::create)),
                            )
                            .route("/import", web::post().to(quotes::import))
                            .service(
                                web::resource("/{reference}")
                                    .route(web::get().to(quotes::get))
                                    .route(web::put().to(quotes::update))
                                    .route(web::delete().to(quotes::delete)),
                            )
                            .route("/{reference}/duplicate", web::post().to(quotes::duplicate))
                            .route("/{reference}/export", web::get().to(quotes::export))
                            .route(
                                "/{reference}/supplier-sheet",
                                web::get().to(quotes::supplier_sheet),
                            ),
                    )
                    .service(
                        web::scope("/drafts")
                            .route("/totals", web::post().to(drafts::totals))
                            .route("/days", web::post().to(drafts::edit_days))
                            .route("/hotel-costs", web::post().to(drafts::hotel_costs))
                            .route("/apply-template", web::post().to(drafts::apply_template))
                            .route("/from-email", web::post().to(drafts::from_email)),
                    ),
            ),
    );
}
