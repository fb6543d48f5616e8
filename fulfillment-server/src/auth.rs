//! JWT authentication
//!
//! Tokens are issued by the identity service and signed with the shared
//! HS256 secret. Handlers take [`CurrentUser`] as an extractor and check
//! ownership with the `ensure_*` helpers.

use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// Caller role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administers exactly one pharmacy
    PharmacyAdmin,
    /// End customer
    User,
    /// Platform operator, passes every ownership check
    SuperAdmin,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    pub role: Role,
    /// Administered pharmacy (pharmacy admins only)
    #[serde(default)]
    pub pharmacy_id: Option<i64>,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub role: Role,
    pub pharmacy_id: Option<i64>,
}

impl CurrentUser {
    /// Caller must administer `pharmacy_id`
    pub fn ensure_pharmacy_admin(&self, pharmacy_id: i64) -> Result<(), AppError> {
        match self.role {
            Role::SuperAdmin => Ok(()),
            Role::PharmacyAdmin if self.pharmacy_id == Some(pharmacy_id) => Ok(()),
            Role::PharmacyAdmin => Err(AppError::permission_denied(format!(
                "Not an administrator of pharmacy {pharmacy_id}"
            ))),
            Role::User => Err(AppError::with_message(
                ErrorCode::RoleRequired,
                "Pharmacy administrator role required",
            )),
        }
    }

    /// Caller must be the customer `user_id`
    pub fn ensure_user(&self, user_id: i64) -> Result<(), AppError> {
        match self.role {
            Role::SuperAdmin => Ok(()),
            Role::User if self.user_id == user_id => Ok(()),
            _ => Err(AppError::permission_denied("Not the owner of this order")),
        }
    }

    /// Pharmacy the caller administers, required for admin-only listings
    pub fn admin_pharmacy(&self) -> Result<i64, AppError> {
        match (self.role, self.pharmacy_id) {
            (Role::PharmacyAdmin, Some(id)) => Ok(id),
            _ => Err(AppError::with_message(
                ErrorCode::RoleRequired,
                "Pharmacy administrator role required",
            )),
        }
    }
}

impl From<Claims> for CurrentUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            pharmacy_id: claims.pharmacy_id,
        }
    }
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token (used by tooling and tests; production tokens come from the identity service)
pub fn create_token(
    user_id: i64,
    role: Role,
    pharmacy_id: Option<i64>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id,
        role,
        pharmacy_id,
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and return its claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::token_expired(),
        _ => {
            tracing::debug!("JWT validation failed: {e}");
            AppError::invalid_token("Invalid token")
        }
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::not_authenticated)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

        let user = CurrentUser::from(verify_token(token, &state.config.jwt_secret)?);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = create_token(3, Role::PharmacyAdmin, Some(9), SECRET).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, 3);
        assert_eq!(claims.role, Role::PharmacyAdmin);
        assert_eq!(claims.pharmacy_id, Some(9));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(3, Role::User, None, SECRET).unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn test_expired_token() {
        let claims = Claims {
            sub: 1,
            role: Role::User,
            pharmacy_id: None,
            exp: 1_000,
            iat: 0,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }

    #[test]
    fn test_ownership_checks() {
        let admin = CurrentUser {
            user_id: 1,
            role: Role::PharmacyAdmin,
            pharmacy_id: Some(4),
        };
        assert!(admin.ensure_pharmacy_admin(4).is_ok());
        assert_eq!(
            admin.ensure_pharmacy_admin(5).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
        assert!(admin.ensure_user(1).is_err());

        let user = CurrentUser {
            user_id: 8,
            role: Role::User,
            pharmacy_id: None,
        };
        assert!(user.ensure_user(8).is_ok());
        assert!(user.ensure_user(9).is_err());
        assert_eq!(
            user.ensure_pharmacy_admin(4).unwrap_err().code,
            ErrorCode::RoleRequired
        );

        let root = CurrentUser {
            user_id: 0,
            role: Role::SuperAdmin,
            pharmacy_id: None,
        };
        assert!(root.ensure_pharmacy_admin(4).is_ok());
        assert!(root.ensure_user(8).is_ok());
        assert!(root.admin_pharmacy().is_err());
    }
}
