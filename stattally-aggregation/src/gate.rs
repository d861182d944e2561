// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Single-permit admission for flush tasks

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admits at most one flush task at a time.
///
/// Acquisition never waits: [`FlushGate::try_acquire`] either hands out the only permit or
/// returns `None`.
#[derive(Debug)]
pub struct FlushGate {
    permit: Arc<Semaphore>,
}

impl Default for FlushGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FlushGate {
    /// Create a gate with its permit available
    pub fn new() -> Self {
        Self {
            permit: Arc::new(Semaphore::new(1)),
        }
    }

    /// Claim the permit if nobody holds it.
    pub fn try_acquire(&self) -> Option<FlushPermit> {
        Arc::clone(&self.permit)
            .try_acquire_owned()
            .ok()
            .map(|permit| FlushPermit { _permit: permit })
    }

    /// True while a [`FlushPermit`] is alive
    pub fn is_held(&self) -> bool {
        self.permit.available_permits() == 0
    }
}

/// Proof of holding the [`FlushGate`]. The gate opens again when this is dropped, including
/// while unwinding from a panic.
#[derive(Debug)]
pub struct FlushPermit {
    _permit: OwnedSemaphorePermit,
}

impl Drop for FlushPermit {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::warn!("stat client panicked during flush, the rest of this generation is lost");
        }
    }
}
