use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier as issued in the token's `roles` claim.
///
/// Roles are opaque strings; only the privileged ones below carry meaning for
/// the client-side gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("ROLE_ADMIN"));
    pub const ORGANIZER: Role = Role(Cow::Borrowed("ROLE_ORGANIZER"));
    pub const USER: Role = Role(Cow::Borrowed("ROLE_USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Roles that may enter the admin area.
pub const PRIVILEGED_ROLES: [Role; 2] = [Role::ADMIN, Role::ORGANIZER];

/// Ordered, de-duplicated set of roles parsed from a role claim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    /// Split a raw claim on commas, trimming whitespace and dropping blanks.
    ///
    /// A single role with no separator yields a one-element set.
    pub fn parse(raw: &str) -> Self {
        let mut roles: Vec<Role> = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            let role = Role::new(name.to_string());
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        Self(roles)
    }

    pub fn contains(&self, role: &Role) -> bool {
        self.0.contains(role)
    }

    pub fn intersects(&self, required: &[Role]) -> bool {
        required.iter().any(|role| self.contains(role))
    }

    /// Holds at least one of [`PRIVILEGED_ROLES`].
    pub fn is_privileged(&self) -> bool {
        self.intersects(&PRIVILEGED_ROLES)
    }

    /// First role as listed in the claim.
    pub fn primary(&self) -> Option<&Role> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    /// Canonical claim form (`"A,B"`).
    pub fn to_claim(&self) -> String {
        self.0.iter().map(Role::as_str).collect::<Vec<_>>().join(",")
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::default();
        for role in iter {
            if !set.contains(&role) {
                set.0.push(role);
            }
        }
        set
    }
}

impl core::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_claim())
    }
}
