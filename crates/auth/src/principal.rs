use serde::{Deserialize, Serialize};

use crate::{Claims, RoleSet};

/// The signed-in user as far as the client can tell from token claims.
///
/// This is a hint for UI decisions only; the server remains the authority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    pub email: Option<String>,
    pub roles: RoleSet,
}

impl Principal {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            email: claims.sub.clone(),
            roles: claims.role_set(),
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.roles.is_privileged()
    }
}

impl From<&Claims> for Principal {
    fn from(claims: &Claims) -> Self {
        Self::from_claims(claims)
    }
}
