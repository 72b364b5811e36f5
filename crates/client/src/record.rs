//! Persisted session record and the auxiliary storage keys around it.
//!
//! At most one record exists per client (single key). Older builds stored the
//! bare token and a few flags under separate keys; those are still read as a
//! fallback and always cleared on logout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_auth::{Claims, Principal};

use crate::storage::{KeyValueStore, StorageError};

/// Key holding the serialized [`SessionRecord`].
pub const SESSION_KEY: &str = "storefront.session";
/// Legacy single-token key.
pub const LEGACY_TOKEN_KEY: &str = "token";
/// Legacy flags written next to the bare token.
pub const LEGACY_FLAG_KEYS: [&str; 3] = ["isLoggedIn", "userEmail", "userRole"];
pub const REMEMBER_ME_KEY: &str = "rememberMe";
pub const REMEMBERED_EMAIL_KEY: &str = "rememberedEmail";

/// Every key a logout must clear.
pub fn session_keys() -> impl Iterator<Item = &'static str> {
    [SESSION_KEY, LEGACY_TOKEN_KEY, REMEMBER_ME_KEY, REMEMBERED_EMAIL_KEY]
        .into_iter()
        .chain(LEGACY_FLAG_KEYS)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub email: Option<String>,
    /// Raw role claim as issued.
    #[serde(default)]
    pub roles: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub token: String,
    #[serde(default)]
    pub user: SessionUser,
    #[serde(default)]
    pub is_logged_in: bool,
    /// Token expiry, epoch seconds.
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>, claims: &Claims, saved_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            user: SessionUser {
                email: claims.sub.clone(),
                roles: claims.roles.clone(),
            },
            is_logged_in: true,
            exp: claims.exp,
            saved_at: Some(saved_at),
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            email: self.user.email.clone(),
            roles: self
                .user
                .roles
                .as_deref()
                .map(storefront_auth::RoleSet::parse)
                .unwrap_or_default(),
        }
    }

    /// Read the record; malformed JSON or an empty token reads as absent.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Option<Self> {
        let raw = store.get(SESSION_KEY)?;
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) if !record.token.trim().is_empty() => Some(record),
            Ok(_) => {
                tracing::debug!("persisted session record has no token; ignoring");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "persisted session record is malformed; ignoring");
                None
            }
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(self)?;
        store.set(SESSION_KEY, &encoded)
    }

    pub fn clear<S: KeyValueStore + ?Sized>(store: &S) -> Result<(), StorageError> {
        store.remove(SESSION_KEY)
    }
}

/// Token from the legacy single-token key, if any.
pub fn legacy_token<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    store
        .get(LEGACY_TOKEN_KEY)
        .filter(|token| !token.trim().is_empty())
}

/// Remembered login email, present only when both the flag and the email are.
pub fn remembered_email<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    let flag = store.get(REMEMBER_ME_KEY)?;
    if flag.trim() != "true" {
        return None;
    }
    store
        .get(REMEMBERED_EMAIL_KEY)
        .filter(|email| !email.trim().is_empty())
}

pub fn save_remembered_email<S: KeyValueStore + ?Sized>(
    store: &S,
    email: &str,
) -> Result<(), StorageError> {
    store.set(REMEMBERED_EMAIL_KEY, email)?;
    store.set(REMEMBER_ME_KEY, "true")
}

pub fn clear_remembered_email<S: KeyValueStore + ?Sized>(store: &S) -> Result<(), StorageError> {
    store.remove(REMEMBER_ME_KEY)?;
    store.remove(REMEMBERED_EMAIL_KEY)
}
