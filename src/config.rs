use std::env;
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};
use crate::services::matching_service::MatchingConfig;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE_NAME: &str = "tour_quotes";
const TOKEN_TTL_HOURS: i64 = 24;
const BACKUP_DIR: &str = "backups";
const BACKUP_RETENTION: usize = 3;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub backup_dir: PathBuf,
    pub backup_retention: usize,
    pub matching: MatchingConfig,
}

impl AppConfig {
    /// Reads the configuration from the environment. `MONGODB_URI` and
    /// `JWT_SECRET` are required; unparsable numbers fall back to defaults.
    pub fn from_env() -> ApiResult<Self> {
        let mongodb_uri = env::var("MONGODB_URI")
            .map_err(|_| ApiError::Config("MONGODB_URI must be set".to_string()))?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| ApiError::Config("JWT_SECRET must be set".to_string()))?;

        let matching_defaults = MatchingConfig::default();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| HOST.to_string()),
            port: parse_or("PORT", PORT),
            mongodb_uri,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| DATABASE_NAME.to_string()),
            jwt_secret,
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", TOKEN_TTL_HOURS),
            backup_dir: env::var("BACKUP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(BACKUP_DIR)),
            backup_retention: parse_or("BACKUP_RETENTION", BACKUP_RETENTION),
            matching: MatchingConfig {
                max_services_per_day: parse_or(
                    "MATCH_MAX_SERVICES_PER_DAY",
                    matching_defaults.max_services_per_day,
                ),
                min_score: parse_or("MATCH_MIN_SCORE", matching_defaults.min_score),
                max_days: parse_or("MATCH_MAX_DAYS", matching_defaults.max_days),
            },
        })
    }

    /// Configuration for tests and tooling that never touch the environment.
    pub fn for_testing(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: HOST.to_string(),
            port: PORT,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: format!("{}_test", DATABASE_NAME),
            jwt_secret: "test_secret".to_string(),
            token_ttl_hours: TOKEN_TTL_HOURS,
            backup_dir: backup_dir.into(),
            backup_retention: BACKUP_RETENTION,
            matching: MatchingConfig::default(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
