//! Session gate: client-side authentication state and view access policy.
//!
//! The gate is the single writer of [`AuthState`]. Views read it through
//! [`SessionGate::state`] and ask [`SessionGate::can_access`] before rendering
//! anything guarded. Navigation is never performed here; results are returned
//! and the caller decides.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_auth::claims::{self, TokenStatus};
use storefront_auth::{AccessRequirement, AuthzError, Claims, Principal, authorize};
use storefront_core::{Clock, Notice, SystemClock};

use crate::notify::{Notifier, PromptListener, PromptMode, PromptRequest, PromptTrigger};
use crate::record::{self, SessionRecord};
use crate::redirect::{Destination, RedirectPolicy};
use crate::storage::KeyValueStore;

/// In-memory session state for the lifetime of the page session.
///
/// `user_role` and `user_email` are copies taken at login/startup; they are not
/// re-derived when the token later expires. Expiry is caught lazily by
/// [`SessionGate::can_access`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub is_authenticated: bool,
    /// Raw role claim, e.g. `"ROLE_USER, ROLE_ADMIN"`.
    pub user_role: Option<String>,
    pub user_email: Option<String>,
    pub show_login_modal: bool,
    pub login_mode: PromptMode,
    #[serde(skip)]
    token: Option<String>,
}

impl AuthState {
    fn authenticated(token: &str, claims: &Claims) -> Self {
        Self {
            is_authenticated: true,
            user_role: claims.roles.clone(),
            user_email: claims.sub.clone(),
            token: Some(token.to_string()),
            ..Self::default()
        }
    }
}

/// Result of a successful login, handed back to the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub principal: Principal,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LoginOutcome {
    pub fn email(&self) -> Option<&str> {
        self.principal.email.as_deref()
    }

    pub fn destination(&self, policy: &dyn RedirectPolicy) -> Destination {
        policy.destination(&self.principal)
    }
}

/// Why a view was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// No token anywhere.
    Unauthenticated,
    /// A token was found but its `exp` has passed.
    SessionExpired,
    /// A token was found but could not be decoded.
    InvalidSession,
    /// Live token without an admin role.
    Forbidden,
}

impl From<&AuthzError> for DenialReason {
    fn from(err: &AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => DenialReason::Unauthenticated,
            AuthzError::TokenExpired => DenialReason::SessionExpired,
            AuthzError::TokenUnparseable => DenialReason::InvalidSession,
            AuthzError::Forbidden { .. } => DenialReason::Forbidden,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(Principal),
    Deny(DenialReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow(_))
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            AccessDecision::Allow(_) => None,
            AccessDecision::Deny(reason) => Some(*reason),
        }
    }
}

pub type SharedNotifier = Arc<dyn Notifier + Send + Sync>;

pub struct SessionGate<S, C = SystemClock> {
    store: S,
    clock: C,
    state: AuthState,
    notifier: SharedNotifier,
    prompt: PromptTrigger,
}

impl<S, C> std::fmt::Debug for SessionGate<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S, C> SessionGate<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Build the gate and rehydrate from whatever session was persisted.
    ///
    /// Storage is only read here; an expired or unreadable session simply
    /// starts anonymous and is reported on the first guarded check.
    pub fn new(store: S, clock: C, notifier: SharedNotifier, prompt: PromptTrigger) -> Self {
        let mut gate = Self {
            store,
            clock,
            state: AuthState::default(),
            notifier,
            prompt,
        };
        gate.rehydrate();
        gate
    }

    fn rehydrate(&mut self) {
        let Some(token) = self.persisted_token() else {
            tracing::debug!("no persisted session");
            return;
        };

        match claims::inspect(&token, self.clock.now()) {
            TokenStatus::Valid(claims) => {
                tracing::info!(email = ?claims.sub, roles = ?claims.roles, "restored persisted session");
                self.state = AuthState::authenticated(&token, &claims);
            }
            TokenStatus::Expired(claims) => {
                tracing::info!(email = ?claims.sub, exp = ?claims.exp, "persisted session has expired");
            }
            TokenStatus::Unparseable => {
                tracing::warn!("persisted session token is unparseable");
            }
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// A cloneable handle guarded views can use to ask for the login prompt.
    pub fn prompt_trigger(&self) -> PromptTrigger {
        self.prompt.clone()
    }

    /// Record a freshly issued token as the active session.
    ///
    /// Unparseable or already expired tokens are refused without touching any
    /// state. A second login simply replaces the first.
    pub fn login_success(&mut self, token: &str) -> Result<LoginOutcome, AuthzError> {
        let now = self.clock.now();
        let claims = match claims::inspect(token, now) {
            TokenStatus::Valid(claims) => claims,
            TokenStatus::Expired(claims) => {
                tracing::warn!(email = ?claims.sub, exp = ?claims.exp, "refusing already expired token");
                return Err(AuthzError::TokenExpired);
            }
            TokenStatus::Unparseable => {
                tracing::warn!("refusing unparseable token");
                return Err(AuthzError::TokenUnparseable);
            }
        };

        let record = SessionRecord::new(token, &claims, now);
        if let Err(err) = record.save(&self.store) {
            tracing::warn!(error = %err, "failed to persist session; continuing in memory");
        }

        self.state = AuthState::authenticated(token, &claims);

        let outcome = LoginOutcome {
            principal: Principal::from_claims(&claims),
            expires_at: claims.expires_at(),
        };
        tracing::info!(email = ?outcome.principal.email, roles = %outcome.principal.roles, "login succeeded");

        Ok(outcome)
    }

    /// Drop the session everywhere. Safe to call when already signed out.
    pub fn logout(&mut self) {
        let was_authenticated = self.state.is_authenticated;
        self.state = AuthState::default();

        for key in record::session_keys() {
            if let Err(err) = self.store.remove(key) {
                tracing::warn!(key, error = %err, "failed to clear persisted session key");
            }
        }

        if was_authenticated {
            tracing::info!("logged out");
        }
    }

    /// Token resolution order: in-memory state, persisted record, legacy key.
    pub fn current_token(&self) -> Option<String> {
        self.state
            .token
            .clone()
            .or_else(|| self.persisted_token())
    }

    fn persisted_token(&self) -> Option<String> {
        SessionRecord::load(&self.store)
            .map(|record| record.token)
            .or_else(|| record::legacy_token(&self.store))
    }

    /// Decide whether a view may render.
    ///
    /// Every denial raises the login prompt. Expired, invalid and forbidden
    /// sessions also get a notice; a plain missing token does not.
    pub fn can_access(&self, require_admin: bool) -> AccessDecision {
        let requirement = AccessRequirement::from_require_admin(require_admin);
        let token = self.current_token();

        match authorize(token.as_deref(), requirement, self.clock.now()) {
            Ok(principal) => AccessDecision::Allow(principal),
            Err(err) => {
                tracing::debug!(error = %err, ?requirement, "access denied");

                let notice = err.notice();
                if let Some(notice) = &notice {
                    self.notifier.notify(notice.clone());
                }
                self.prompt.raise(PromptRequest::login().because(notice));

                AccessDecision::Deny(DenialReason::from(&err))
            }
        }
    }

    /// Push a notice to whatever renders banners.
    pub fn announce(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    pub fn open_login_prompt(&mut self, mode: PromptMode) {
        self.state.show_login_modal = true;
        self.state.login_mode = mode;
    }

    pub fn dismiss_login_prompt(&mut self) {
        self.state.show_login_modal = false;
        self.state.login_mode = PromptMode::Login;
    }

    /// Answer pending prompt requests; the listener side of the prompt channel.
    pub fn answer_prompt(&mut self, listener: &PromptListener) -> Option<PromptRequest> {
        let request = listener.poll()?;
        self.open_login_prompt(request.mode);
        Some(request)
    }

    pub fn remember_email(&self, email: &str) {
        if let Err(err) = record::save_remembered_email(&self.store, email) {
            tracing::warn!(error = %err, "failed to store remembered email");
        }
    }

    pub fn forget_email(&self) {
        if let Err(err) = record::clear_remembered_email(&self.store) {
            tracing::warn!(error = %err, "failed to clear remembered email");
        }
    }

    pub fn remembered_email(&self) -> Option<String> {
        record::remembered_email(&self.store)
    }
}
