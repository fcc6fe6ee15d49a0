use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{MintflowError, Result};

/// Single-slot "operation in flight" flag.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot or fail with `OperationInProgress`. Released when the lease drops.
    pub fn try_acquire(&self) -> Result<InFlightLease<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MintflowError::OperationInProgress)?;
        Ok(InFlightLease { slot: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct InFlightLease<'a> {
    slot: &'a InFlight,
}

impl Drop for InFlightLease<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}
