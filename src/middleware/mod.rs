pub mod auth;
pub mod auth_context;
pub mod role_auth;
