use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{config::AuthConfig, errors::AuthError, errors::ServerError};

/// The claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub login: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: config.token_expiry,
        }
    }

    pub fn issue_token(&self, user_id: i64, login: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims =
            JwtClaims { user_id, login: login.to_string(), iat: now.timestamp(), exp: (now + self.expiry).timestamp() };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::ValidationError("signature has failed verification".into()),
            _ => AuthError::PoorlyFormattedToken(e.to_string()),
        })?;
        Ok(data.claims)
    }
}

/// Pulls the bearer token out of an `Authorization` header value.
pub fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<JwtClaims, ServerError> {
    let issuer = req.app_data::<web::Data<TokenIssuer>>().ok_or_else(|| {
        error!("💻️ No token issuer has been configured for this server");
        ServerError::ConfigurationError("No token issuer configured".into())
    })?;
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let header = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
    let token = extract_bearer(header).ok_or_else(|| AuthError::PoorlyFormattedToken("Expected a Bearer token".into()))?;
    let claims = issuer.verify(token).map_err(|e| {
        debug!("💻️ Rejected bearer token. {e}");
        e
    })?;
    trace!("💻️ Request authenticated for user #{} ({})", claims.user_id, claims.login);
    Ok(claims)
}
