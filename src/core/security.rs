#![allow(dead_code)]

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("identity token encoding failed")]
    TokenEncoding,
    #[error("identity token verification failed")]
    TokenVerification,
    #[error("unsupported jwt algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Claims issued by the platform identity provider. `sub` is the stable
/// external identity key; email and name are best-effort profile claims.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct IdentityClaims {
    pub(crate) sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    pub(crate) exp: i64,
}

pub(crate) fn verify_identity_token(
    token: &str,
    settings: &Settings,
) -> Result<IdentityClaims, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = true;
    validation.required_spec_claims.insert("exp".to_string());
    validation.required_spec_claims.insert("sub".to_string());

    decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(settings.identity().secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::TokenVerification)
}

/// Mint a token the way the identity provider would. Used by fixtures and
/// local tooling; the service itself only ever verifies.
pub(crate) fn create_identity_token(
    subject: &str,
    email: Option<&str>,
    name: Option<&str>,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let algorithm = algorithm_from_settings(settings)?;
    let expire = OffsetDateTime::now_utc()
        + expires_in.unwrap_or_else(|| {
            Duration::minutes(settings.identity().token_expire_minutes as i64)
        });

    let claims = IdentityClaims {
        sub: subject.to_string(),
        email: email.map(str::to_string),
        name: name.map(str::to_string),
        exp: expire.unix_timestamp(),
    };

    encode(
        &jsonwebtoken::Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(settings.identity().secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::TokenEncoding)
}

fn algorithm_from_settings(settings: &Settings) -> Result<Algorithm, SecurityError> {
    match settings.identity().algorithm.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        other => Err(SecurityError::UnsupportedAlgorithm(other.to_string())),
    }
}
