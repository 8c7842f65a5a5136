//! Member identity and JWT claims

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Authenticated member, as asserted by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Member {
    pub id: i32,
    pub username: String,
    /// Staff accounts manage the catalog and never borrow or review
    pub is_staff: bool,
}

/// JWT Claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub username: String,
    #[serde(default)]
    pub is_staff: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn member(&self) -> Member {
        Member {
            id: self.user_id,
            username: self.username.clone(),
            is_staff: self.is_staff,
        }
    }

    /// Reject staff accounts from member-only pages
    pub fn require_member(&self) -> Result<(), AppError> {
        if self.is_staff {
            Err(AppError::Authorization(
                "This page is reserved to library members".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
