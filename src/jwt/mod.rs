//! JWT session token handling

use crate::config::JwtConfig;
use crate::domain::{StringUuid, TokenMode, TokenUse};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token claims. One token proves one authenticated session for a
/// (user, mode, use) triple; the optional account/hierarchy claims mirror the
/// user's default role assignment at mint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Default account ID, if one is bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Hierarchy rank the default account is anchored to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<String>,
    /// Environment the token was minted for
    pub mode: TokenMode,
    /// What the token is used for
    #[serde(rename = "use")]
    pub token_use: TokenUse,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager, HMAC-signed with a process-wide secret.
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Create a Validation with a strict leeway (5 seconds) instead of the
    /// default 60 seconds. Tokens expire promptly while still tolerating
    /// minor clock skew.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.validate_aud = false;
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    /// Create a session token; returns the signed value and its expiry.
    pub fn create_session_token(
        &self,
        user_id: StringUuid,
        email: &str,
        account: Option<StringUuid>,
        hierarchy: Option<StringUuid>,
        mode: TokenMode,
        token_use: TokenUse,
    ) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.session_ttl_secs);

        let claims = SessionClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            account: account.map(|id| id.to_string()),
            hierarchy: hierarchy.map(|id| id.to_string()),
            mode,
            token_use,
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok((token, exp))
    }

    /// Verify signature, issuer, and the payload's own expiry claim.
    pub fn verify_session_token(&self, token: &str) -> Result<SessionClaims> {
        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &self.strict_validation())?;
        Ok(token_data.claims)
    }

    /// Session lifetime in seconds
    pub fn session_ttl(&self) -> i64 {
        self.config.session_ttl_secs
    }
}
