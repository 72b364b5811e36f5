//! Post-login destinations.
//!
//! The gate reports who signed in; where to go next is the entry point's call.
//! Header login, admin login and registration auto-login each pick a policy.

use serde::Serialize;

use storefront_auth::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Remain on the current page.
    Stay,
    /// Storefront landing page.
    Home,
    /// Admin dashboard.
    AdminArea,
}

pub trait RedirectPolicy {
    fn destination(&self, principal: &Principal) -> Destination;
}

/// Always stay put (e.g. registration auto-login).
#[derive(Debug, Clone, Copy, Default)]
pub struct StayOnPage;

impl RedirectPolicy for StayOnPage {
    fn destination(&self, _principal: &Principal) -> Destination {
        Destination::Stay
    }
}

/// Send privileged users to the dashboard, everyone else stays (header login).
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminAware;

impl RedirectPolicy for AdminAware {
    fn destination(&self, principal: &Principal) -> Destination {
        if principal.is_privileged() {
            Destination::AdminArea
        } else {
            Destination::Stay
        }
    }
}

/// Admin login page: non-privileged users are sent home.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminOnly;

impl RedirectPolicy for AdminOnly {
    fn destination(&self, principal: &Principal) -> Destination {
        if principal.is_privileged() {
            Destination::AdminArea
        } else {
            Destination::Home
        }
    }
}

impl<F> RedirectPolicy for F
where
    F: Fn(&Principal) -> Destination,
{
    fn destination(&self, principal: &Principal) -> Destination {
        self(principal)
    }
}
