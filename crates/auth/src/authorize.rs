use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use storefront_core::Notice;

use crate::claims::{self, TokenStatus};
use crate::{Principal, RoleSet};

/// What a guarded view asks of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRequirement {
    /// Any signed-in user with a live token.
    Authenticated,
    /// A live token carrying `ROLE_ADMIN` or `ROLE_ORGANIZER`.
    Admin,
}

impl AccessRequirement {
    pub fn from_require_admin(require_admin: bool) -> Self {
        if require_admin {
            Self::Admin
        } else {
            Self::Authenticated
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no bearer token present")]
    Unauthenticated,

    #[error("bearer token is unparseable")]
    TokenUnparseable,

    #[error("bearer token has expired")]
    TokenExpired,

    #[error("forbidden: roles '{held}' do not include an admin role")]
    Forbidden { held: RoleSet },
}

impl AuthzError {
    /// The token was present but can no longer be used.
    pub fn is_stale_session(&self) -> bool {
        matches!(self, AuthzError::TokenExpired | AuthzError::TokenUnparseable)
    }

    /// Human-readable notice for denials the user should be told about.
    ///
    /// A missing token is not announced; the login prompt speaks for itself.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            AuthzError::Unauthenticated => None,
            AuthzError::TokenExpired => {
                Some(Notice::warning("Your session has expired. Please log in again."))
            }
            AuthzError::TokenUnparseable => Some(Notice::warning(
                "Your session could not be verified. Please log in again.",
            )),
            AuthzError::Forbidden { .. } => Some(Notice::error(
                "You do not have permission to access this page.",
            )),
        }
    }
}

/// Decide whether `token` satisfies `requirement` at `now`.
///
/// - No IO
/// - No panics
/// - Absent, unparseable and expired tokens stay distinguishable
pub fn authorize(
    token: Option<&str>,
    requirement: AccessRequirement,
    now: DateTime<Utc>,
) -> Result<Principal, AuthzError> {
    let token = token
        .filter(|token| !token.trim().is_empty())
        .ok_or(AuthzError::Unauthenticated)?;

    let claims = match claims::inspect(token, now) {
        TokenStatus::Valid(claims) => claims,
        TokenStatus::Expired(_) => return Err(AuthzError::TokenExpired),
        TokenStatus::Unparseable => return Err(AuthzError::TokenUnparseable),
    };

    let principal = Principal::from_claims(&claims);

    if requirement == AccessRequirement::Admin && !principal.is_privileged() {
        return Err(AuthzError::Forbidden {
            held: principal.roles,
        });
    }

    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Claims;
    use jsonwebtoken::{EncodingKey, Header};

    const NOW: i64 = 1_750_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    fn mint(roles: &str, exp: i64) -> String {
        let claims = Claims {
            sub: Some("dana@example.com".to_string()),
            roles: Some(roles.to_string()),
            exp: Some(exp),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s"))
            .expect("failed to encode jwt")
    }

    #[test]
    fn missing_or_blank_token_is_unauthenticated() {
        let req = AccessRequirement::Authenticated;
        assert_eq!(authorize(None, req, now()), Err(AuthzError::Unauthenticated));
        assert_eq!(authorize(Some("  "), req, now()), Err(AuthzError::Unauthenticated));
    }

    #[test]
    fn expired_and_unparseable_are_distinct() {
        let req = AccessRequirement::Authenticated;
        let expired = mint("ROLE_USER", NOW - 10);

        assert_eq!(authorize(Some(&expired), req, now()), Err(AuthzError::TokenExpired));
        assert_eq!(authorize(Some("nope"), req, now()), Err(AuthzError::TokenUnparseable));
    }

    #[test]
    fn live_user_token_is_allowed_for_plain_views() {
        let token = mint("ROLE_USER", NOW + 3600);
        let principal = authorize(Some(&token), AccessRequirement::Authenticated, now()).unwrap();

        assert_eq!(principal.email.as_deref(), Some("dana@example.com"));
        assert!(!principal.is_privileged());
    }

    #[test]
    fn admin_views_require_a_privileged_role() {
        let admin = AccessRequirement::from_require_admin(true);

        let user = mint("ROLE_USER", NOW + 60);
        assert!(matches!(
            authorize(Some(&user), admin, now()),
            Err(AuthzError::Forbidden { .. })
        ));

        for roles in ["ROLE_ADMIN", "ROLE_ORGANIZER", "ROLE_USER, ROLE_ADMIN"] {
            let token = mint(roles, NOW + 60);
            assert!(authorize(Some(&token), admin, now()).is_ok(), "{roles} should be allowed");
        }
    }

    #[test]
    fn notices_differ_per_denial() {
        let expired = AuthzError::TokenExpired.notice().unwrap();
        let invalid = AuthzError::TokenUnparseable.notice().unwrap();
        let forbidden = AuthzError::Forbidden { held: RoleSet::parse("ROLE_USER") }
            .notice()
            .unwrap();

        assert_eq!(AuthzError::Unauthenticated.notice(), None);
        assert_ne!(expired.message, invalid.message);
        assert_ne!(expired.message, forbidden.message);
        assert!(AuthzError::TokenExpired.is_stale_session());
        assert!(!AuthzError::Unauthenticated.is_stale_session());
        assert!(!AuthzError::Forbidden { held: RoleSet::default() }.is_stale_session());
    }
}
