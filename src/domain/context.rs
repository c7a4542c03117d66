//! Per-request authorization context
//!
//! Built by the boundary layer from validated session claims and threaded
//! explicitly through every downstream call, so ownership checks always take
//! the caller as a parameter instead of reaching for global state.

use super::account::Role;
use super::common::StringUuid;
use crate::jwt::SessionClaims;
use anyhow::Context as _;

/// Identity attached to a call after successful token validation.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: StringUuid,
    pub account_id: Option<StringUuid>,
    pub role: Option<Role>,
}

impl AuthContext {
    pub fn new(user_id: StringUuid) -> Self {
        Self {
            user_id,
            account_id: None,
            role: None,
        }
    }
}

impl TryFrom<&SessionClaims> for AuthContext {
    type Error = crate::error::AppError;

    fn try_from(claims: &SessionClaims) -> Result<Self, Self::Error> {
        let user_id = StringUuid::parse_str(&claims.sub)
            .context("session claims carry a malformed subject")?;
        let account_id = claims
            .account
            .as_deref()
            .map(StringUuid::parse_str)
            .transpose()
            .context("session claims carry a malformed account id")?;

        Ok(Self {
            user_id,
            account_id,
            role: None,
        })
    }
}
