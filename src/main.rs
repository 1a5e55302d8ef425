use std::io;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use tour_quote_api::{config::AppConfig, db, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    log::info!("Application starting...");

    let config = AppConfig::from_env().map_err(|e| io::Error::other(e.to_string()))?;

    let client = db::mongo::create_mongo_client(&config.mongodb_uri)
        .await
        .map_err(|e| io::Error::other(e.to_string()))?;
    let database = client.database(&config.database_name);
    if let Err(e) = db::mongo::ensure_indexes(&database).await {
        log::warn!("Could not ensure indexes: {}", e);
    }

    let bind = (config.host.clone(), config.port);
    log::info!("Binding to {}:{}", bind.0, bind.1);

    let config = web::Data::new(config);
    let database = web::Data::new(database);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(config.clone())
            .app_data(database.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
