//! Login and registration flows behind the session prompt.
//!
//! These glue the credential service to the gate. Every failure comes back as
//! a [`FormError`] whose [`FormError::inline_message`] the form renders; nothing
//! here escapes as an unhandled error.

use thiserror::Error;

use storefront_auth::AuthzError;
use storefront_core::{Clock, DomainError, Email, Notice};

use crate::credentials::{CredentialClient, CredentialError, LoginRequest, RegisterRequest};
use crate::gate::{LoginOutcome, SessionGate};
use crate::storage::KeyValueStore;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, DomainError> {
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::missing("password"));
        }
        Ok(LoginRequest {
            email: email.into(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<RegisterRequest, DomainError> {
        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            return Err(DomainError::missing("full name"));
        }
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::missing("password"));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        Ok(RegisterRequest {
            full_name: full_name.to_string(),
            email: email.into(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Service(#[from] CredentialError),

    #[error("credential service issued an unusable token: {0}")]
    Session(#[from] AuthzError),
}

impl FormError {
    pub fn inline_message(&self) -> String {
        match self {
            FormError::Invalid(DomainError::Missing(field)) => format!("Please enter your {field}."),
            FormError::Invalid(DomainError::InvalidEmail(_)) => {
                "Please enter a valid email address.".to_string()
            }
            FormError::Invalid(DomainError::Validation(message)) => message.clone(),
            FormError::Service(err) => err.user_message(),
            FormError::Session(_) => {
                "Login failed: the server returned an invalid session. Please try again.".to_string()
            }
        }
    }
}

/// Validate, authenticate, and open the session.
pub async fn sign_in<S, C>(
    client: &CredentialClient,
    gate: &mut SessionGate<S, C>,
    form: &LoginForm,
) -> Result<LoginOutcome, FormError>
where
    S: KeyValueStore,
    C: Clock,
{
    let request = form.validate()?;
    let outcome = open_session(client, gate, &request).await?;

    if form.remember_me {
        gate.remember_email(&request.email);
    } else {
        gate.forget_email();
    }

    Ok(outcome)
}

/// Register a new account, then sign in with the same credentials.
///
/// The remembered login email is left as it was.
pub async fn register_and_sign_in<S, C>(
    client: &CredentialClient,
    gate: &mut SessionGate<S, C>,
    form: &RegistrationForm,
) -> Result<LoginOutcome, FormError>
where
    S: KeyValueStore,
    C: Clock,
{
    let request = form.validate()?;
    client.register(&request).await?;
    tracing::info!(email = %request.email, "registered new account");

    let login = LoginRequest {
        email: request.email,
        password: request.password,
    };
    let outcome = open_session(client, gate, &login).await?;

    gate.announce(Notice::success("Registration successful. Welcome!"));
    Ok(outcome)
}

async fn open_session<S, C>(
    client: &CredentialClient,
    gate: &mut SessionGate<S, C>,
    request: &LoginRequest,
) -> Result<LoginOutcome, FormError>
where
    S: KeyValueStore,
    C: Clock,
{
    let response = client.login(request).await?;
    let outcome = gate.login_success(&response.token)?;
    gate.announce(Notice::success("Login successful."));
    Ok(outcome)
}
