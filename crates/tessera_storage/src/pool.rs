//! Reusable scratch buffers.
//!
//! Masks handed back on a query cache hit and the identity lists built during
//! a despawn cascade are recycled here instead of being reallocated.

use crate::mask::Mask;

/// Values that can be reset for reuse without freeing their storage.
pub trait Recycle: Default {
    /// Clears contents, keeping capacity.
    fn recycle(&mut self);
}

impl<T> Recycle for Vec<T> {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl Recycle for Mask {
    fn recycle(&mut self) {
        self.clear();
    }
}

/// A stack of cleared, ready-to-use values.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    limit: usize,
}

/// Pool of identity or key lists.
pub type ScratchPool<T> = Pool<Vec<T>>;

/// Pool of masks.
pub type MaskPool = Pool<Mask>;

impl<T: Recycle> Default for Pool<T> {
    fn default() -> Self {
        Self::new(32)
    }
}

impl<T: Recycle> Pool<T> {
    /// Creates a pool that retains at most `limit` idle values.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            free: Vec::new(),
            limit,
        }
    }

    /// Takes a cleared value, allocating one if the pool is empty.
    pub fn get(&mut self) -> T {
        self.free.pop().unwrap_or_default()
    }

    /// Returns a value to the pool. Values beyond the limit are dropped.
    pub fn put(&mut self, mut value: T) {
        if self.free.len() < self.limit {
            value.recycle();
            self.free.push(value);
        }
    }

    /// Number of idle values held.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.len()
    }
}
