use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }

    /// Unknown role strings get the least privileged role.
    pub fn from_claim(role: &str) -> Self {
        match role {
            "admin" => UserRole::Admin,
            _ => UserRole::Staff,
        }
    }

    /// Admins pass every role check.
    pub fn satisfies(&self, required: UserRole) -> bool {
        *self == required || *self == UserRole::Admin
    }
}

/// Agency staff account. Accounts are provisioned by an administrator;
/// there is no self-service signup.
#[derive(Debug, Deserialize, Serialize)]
pub struct StaffUser {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub password: String, // Always hashed
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    pub last_signin: Option<DateTime<Utc>>,
    pub failed_signins: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct StaffSession {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_checks() {
        assert!(UserRole::Admin.satisfies(UserRole::Staff));
        assert!(UserRole::Admin.satisfies(UserRole::Admin));
        assert!(UserRole::Staff.satisfies(UserRole::Staff));
        assert!(!UserRole::Staff.satisfies(UserRole::Admin));
    }

    #[test]
    fn test_from_claim() {
        assert_eq!(UserRole::from_claim("admin"), UserRole::Admin);
        assert_eq!(UserRole::from_claim("staff"), UserRole::Staff);
        assert_eq!(UserRole::from_claim("root"), UserRole::Staff);
    }
}
