//! Fixed-set resource manager: one [`TimedLock`] per resource.

use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::lock::TimedLock;
use crate::resource::ResourceId;
use crate::unrecoverable;

/// Recoverable acquisition outcomes. Out-of-range resource ids are programmer
/// errors and panic via [`unrecoverable!`] instead of appearing here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("timed out after {waited:?} waiting for {resource:?}")]
    Timeout {
        resource: ResourceId,
        waited: Duration,
    },
}

/// Opaque proof of ownership of one resource, minted only by
/// [`ResourceManager::acquire`] and consumed by [`ResourceManager::release`].
/// Deliberately neither `Clone` nor `Copy`.
#[must_use = "a dropped token leaves its resource held; hand it to release()"]
#[derive(Debug)]
pub struct HoldToken {
    resource: ResourceId,
}

impl HoldToken {
    pub fn resource(&self) -> ResourceId {
        self.resource
    }
}

/// Owns the immutable lock set `{R0..Rn-1}`; shared across all workers by
/// `Arc`. All lock/unlock traffic goes through the per-resource [`TimedLock`],
/// no further synchronization is layered on top.
pub struct ResourceManager {
    locks: Vec<TimedLock>,
}

impl ResourceManager {
    /// Builds the fixed lock set. `resources` must be at least 1.
    pub fn new(resources: u32) -> Self {
        if resources == 0 {
            unrecoverable!("a resource manager needs at least one resource");
        }
        let locks = (0..resources).map(|_| TimedLock::new()).collect();
        Self { locks }
    }

    pub fn resources(&self) -> u32 {
        self.locks.len() as u32
    }

    /// All ids in the fixed set, in canonical ascending order.
    pub fn resource_ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        (0..self.resources()).map(ResourceId::new)
    }

    fn lock_for(&self, id: ResourceId) -> &TimedLock {
        match self.locks.get(id.index()) {
            Some(lock) => lock,
            None => unrecoverable!(
                "{:?} is outside the fixed set of {} resources",
                id,
                self.locks.len()
            ),
        }
    }

    /// Bounded-wait acquisition of one resource.
    pub fn acquire(&self, id: ResourceId, timeout: Duration) -> Result<HoldToken, AcquireError> {
        if self.lock_for(id).try_acquire_for(timeout) {
            debug!("acquired {:?}", id);
            Ok(HoldToken { resource: id })
        } else {
            debug!("timed out waiting for {:?}", id);
            Err(AcquireError::Timeout {
                resource: id,
                waited: timeout,
            })
        }
    }

    /// Unbounded blocking acquisition, for the ordered baseline.
    pub fn acquire_blocking(&self, id: ResourceId) -> HoldToken {
        self.lock_for(id).acquire();
        debug!("acquired {:?} (blocking)", id);
        HoldToken { resource: id }
    }

    /// Releases a possibly-absent token. `None` is a safe no-op so cleanup
    /// paths can unconditionally release every slot of an attempt, acquired
    /// or not.
    pub fn release(&self, token: Option<HoldToken>) {
        if let Some(token) = token {
            self.lock_for(token.resource).release();
            debug!("released {:?}", token.resource);
        }
    }

    /// Holder-state snapshot for one resource.
    pub fn is_held(&self, id: ResourceId) -> bool {
        self.lock_for(id).is_held()
    }
}
