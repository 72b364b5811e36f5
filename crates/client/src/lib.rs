//! `storefront-client`
//!
//! **Responsibility:** client-side session handling for the storefront.
//!
//! This crate provides:
//! - The session gate (auth state, login/logout transitions, view access checks)
//! - A persisted session record behind a small key-value storage port
//! - Notice and login-prompt channels for the view layer
//! - An HTTP client and form flows for the remote credential service
//!
//! The credential service remains the authority; this crate only consumes the
//! bearer token it issues.

pub mod config;
pub mod credentials;
pub mod flow;
pub mod gate;
pub mod notify;
pub mod record;
pub mod redirect;
pub mod storage;

pub use config::ClientConfig;
pub use credentials::{CredentialClient, CredentialError};
pub use flow::{FormError, LoginForm, RegistrationForm, register_and_sign_in, sign_in};
pub use gate::{AccessDecision, AuthState, DenialReason, LoginOutcome, SessionGate, SharedNotifier};
pub use notify::{NoticeQueue, Notifier, PromptListener, PromptMode, PromptRequest, PromptTrigger, TracingNotifier, prompt_channel};
pub use record::SessionRecord;
pub use redirect::{AdminAware, AdminOnly, Destination, RedirectPolicy, StayOnPage};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
