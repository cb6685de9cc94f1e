//! Authorization guard: role gate and ownership gate.
//!
//! Plain functions over an explicit [`Identity`]; the HTTP layer wraps them in
//! extractors and the services call them after loading the resource.

use uuid::Uuid;

use super::{Identity, UserRole};
use crate::errors::{AppError, AppResult};

/// A resource with an immutable author reference.
pub trait Owned {
    fn author_id(&self) -> Uuid;
}

/// Require an identity whose role is one of `allowed`.
///
/// Safe to use without a preceding authentication step: a missing identity
/// is `Unauthenticated`, a role outside the set is `Forbidden`.
pub fn require_role<'a>(
    identity: Option<&'a Identity>,
    allowed: &[UserRole],
) -> AppResult<&'a Identity> {
    let identity = identity.ok_or(AppError::Unauthenticated)?;
    if allowed.contains(&identity.role) {
        Ok(identity)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Require admin role.
pub fn require_admin(identity: &Identity) -> AppResult<()> {
    require_role(Some(identity), &[UserRole::Admin]).map(|_| ())
}

/// True iff the caller is an admin or authored the resource.
pub fn is_owner_or_admin<R: Owned + ?Sized>(identity: &Identity, resource: &R) -> bool {
    identity.is_admin() || resource.author_id() == identity.id
}

/// Ownership gate. Call only once the resource is known to exist.
pub fn ensure_owner_or_admin<R: Owned + ?Sized>(identity: &Identity, resource: &R) -> AppResult<()> {
    if is_owner_or_admin(identity, resource) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
