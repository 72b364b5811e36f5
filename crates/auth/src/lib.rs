//! `storefront-auth`: client-side token inspection and access policy.
//!
//! No storage, no transport. Bearer-token claims are read without verifying
//! signatures (the issuing server is the trust boundary) and turned into
//! allow/deny decisions for views.

pub mod authorize;
pub mod claims;
pub mod principal;
pub mod roles;

pub use authorize::{AccessRequirement, AuthzError, authorize};
pub use claims::{Claims, TokenError, TokenStatus};
pub use principal::Principal;
pub use roles::{PRIVILEGED_ROLES, Role, RoleSet};
