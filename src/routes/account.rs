use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;
use mongodb::Database;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::db::staff;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::generate_token;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::account::{SigninRequest, StaffSession};

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub auth_token: String,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

pub async fn signin(
    db: web::Data<Database>,
    config: web::Data<AppConfig>,
    input: web::Json<SigninRequest>,
) -> ApiResult<HttpResponse> {
    let input = input.into_inner();

    let user = staff::find_by_email(&db, &input.email)
        .await?
        .ok_or_else(invalid_credentials)?;
    let user_id = user
        .id
        .ok_or_else(|| ApiError::internal("staff record without _id"))?;

    if !bcrypt::verify(&input.password, &user.password).unwrap_or(false) {
        staff::record_failed_signin(&db, &user_id).await?;
        log::warn!("Failed sign-in for {}", user.email);
        return Err(invalid_credentials());
    }

    staff::record_signin(&db, &user_id).await?;
    let token = generate_token(&config, &user.email, &user_id, user.role)?;
    log::info!("{} signed in", user.email);

    Ok(HttpResponse::Ok().json(TokenResponse { auth_token: token }))
}

pub async fn session(user: AuthenticatedUser, db: web::Data<Database>) -> ApiResult<HttpResponse> {
    let user_id = ObjectId::parse_str(&user.user_id)
        .map_err(|_| ApiError::Unauthorized("Invalid user ID".to_string()))?;

    let staff_user = staff::find_by_id(&db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    Ok(HttpResponse::Ok().json(StaffSession {
        user_id: user_id.to_hex(),
        email: staff_user.email,
        first_name: staff_user.first_name.unwrap_or_default(),
        last_name: staff_user.last_name.unwrap_or_default(),
        role: staff_user.role,
    }))
}
