//! Ownership guard.
//!
//! Every read or write that exposes or mutates a budget or expense is gated
//! on the caller being the resource's owner. Identities are opaque and only
//! compared for equality.

use tally_shared::types::OwnerId;
use thiserror::Error;

use crate::budget::Budget;
use crate::expense::Expense;

/// The caller does not own the resource it tried to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Caller {caller} does not own the requested resource")]
pub struct Unauthorized {
    /// Identity that attempted the access.
    pub caller: OwnerId,
}

/// Entities scoped to a single owner.
pub trait Owned {
    /// Returns the owning identity.
    fn owner(&self) -> OwnerId;
}

impl Owned for Budget {
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}

impl Owned for Expense {
    fn owner(&self) -> OwnerId {
        self.owner_id
    }
}

/// Checks that `caller` is `resource_owner`.
pub fn authorize(caller: OwnerId, resource_owner: OwnerId) -> Result<(), Unauthorized> {
    if caller == resource_owner {
        Ok(())
    } else {
        Err(Unauthorized { caller })
    }
}

/// Checks that `caller` owns `resource`.
pub fn authorize_resource<R: Owned + ?Sized>(
    caller: OwnerId,
    resource: &R,
) -> Result<(), Unauthorized> {
    authorize(caller, resource.owner())
}
