//! Admin bootstrap policy.
//!
//! Who may create an admin account depends only on how many admins exist:
//!
//! | admins | allowed callers          |
//! |--------|--------------------------|
//! | 0      | anyone, even anonymous   |
//! | 1      | an authenticated admin   |
//! | 2+     | nobody                   |

use crate::config::MAX_ADMIN_ACCOUNTS;
use crate::domain::Identity;
use crate::errors::{AppError, AppResult};

/// Permission to create one admin, tied to the admin count it was granted at.
///
/// Only [`evaluate`] can produce one; the store's conditional insert uses
/// `observed_admins` to reject the create if the count moved in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminSlot {
    observed_admins: u64,
}

impl AdminSlot {
    pub fn observed_admins(&self) -> u64 {
        self.observed_admins
    }
}

/// Decide whether `caller` may create an admin while `admin_count` admins exist.
pub fn evaluate(caller: Option<&Identity>, admin_count: u64) -> AppResult<AdminSlot> {
    let slot = AdminSlot {
        observed_admins: admin_count,
    };

    match admin_count {
        0 => Ok(slot),
        n if n < MAX_ADMIN_ACCOUNTS => match caller {
            Some(identity) if identity.is_admin() => Ok(slot),
            _ => Err(AppError::Forbidden),
        },
        _ => Err(AppError::Forbidden),
    }
}
