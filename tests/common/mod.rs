use std::path::Path;

use actix_web::{web, App};
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, Database};
use tempfile::TempDir;

use tour_quote_api::config::AppConfig;
use tour_quote_api::middleware::auth::generate_token;
use tour_quote_api::models::account::UserRole;
use tour_quote_api::routes;

pub const STAFF_EMAIL: &str = "staff@agency.test";

/// App under test. The Mongo client is created lazily and never connects,
/// so only routes that stop before the database can be exercised.
pub struct TestApp {
    pub config: AppConfig,
    pub database: Database,
    backups: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let backups = tempfile::tempdir().expect("temp backup dir");
        let config = AppConfig::for_testing(backups.path());
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .expect("valid MongoDB URI");
        let database = client.database(&config.database_name);

        Self {
            config,
            database,
            backups,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        self.backups.path()
    }

    pub fn bearer(&self, role: UserRole) -> String {
        let token = generate_token(&self.config, STAFF_EMAIL, &ObjectId::new(), role)
            .expect("token generation");
        format!("Bearer {}", token)
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.database.clone()))
            .configure(routes::configure)
    }
}
