// src/tree/ids.rs

//! Identity allocation for persisted trees and nodes.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of stable identities for newly created trees and nodes.
///
/// The owning document (project loader) normally provides this; tests and the
/// CLI use [`SequentialIds`].
pub trait IdAllocator: Send + Sync + Debug {
    fn next_id(&self) -> u64;
}

/// Monotonic in-memory allocator.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
