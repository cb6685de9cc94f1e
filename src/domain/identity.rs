//! Per-request authenticated identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{User, UserRole};

/// Subject id and role of the caller, rebuilt on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub role: UserRole,
}

impl Identity {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}
