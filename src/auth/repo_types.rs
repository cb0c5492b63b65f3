use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Role carried by the `user_role` Postgres enum and by access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
    Manager,
}

impl UserRole {
    pub fn is_staff(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

/// User record in the database. Accounts are provisioned by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub karma_points: i32,
}
