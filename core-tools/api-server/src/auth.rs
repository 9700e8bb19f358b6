//! Bearer token extraction
//!
//! The token is passed through to the conversation store untouched; the
//! store decides whether it is valid.

use crate::error::ApiError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use pitch_engine::secrets::SecretString;
use sdk::PitchError;

/// `Authorization: Bearer <token>`
#[derive(Debug, Clone)]
pub struct BearerToken(pub SecretString);

impl BearerToken {
    pub fn parse(header: &str) -> Result<Self, PitchError> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(SecretString::new(token)))
            .ok_or_else(|| PitchError::Auth("Invalid authorization header format".to_string()))
    }

    pub fn secret(&self) -> &SecretString {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| PitchError::Auth("Missing authorization header".to_string()))?
            .to_str()
            .map_err(|_| PitchError::Auth("Invalid authorization header format".to_string()))?;

        Ok(Self::parse(header)?)
    }
}
