use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    claims::{Claims, TokenKind},
    repo_types::UserRole,
};
use crate::{config::JwtConfig, error::AppError, state::AppState};

/// Verification half of the auth service's HS256 keys.
#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
        } = state.config.jwt.clone();
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }
}

impl JwtKeys {
    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }
}

/// Authenticated caller taken from a bearer access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: UserRole,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(_) => {
                warn!("invalid or expired token");
                return Err(AppError::Unauthorized("Invalid or expired token".into()));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("Access token required".into()));
        }

        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Caller holding the admin or manager role.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_staff() {
            warn!(user_id = %user.id, role = ?user.role, "admin route denied");
            return Err(AppError::Forbidden("Access denied. Admin only.".into()));
        }
        Ok(AdminUser(user.id))
    }
}
