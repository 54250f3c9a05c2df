//! Pooled hash-set buckets.
//!
//! Both schedulers key sets of registrations by date.  Buckets churn fast —
//! one empties every time a date fires — so drained buckets are parked in a
//! small pool and handed back out on the next insert instead of being
//! reallocated.  Pooling is invisible to callers; it carries no
//! observable-behavior contract.

use rustc_hash::FxHashSet;

/// The per-date set of registrations.
///
/// Arbitrarily many distinct keys may share one date (two weapons with the
/// same reload span starting at the same instant, for example).  Iteration
/// order within a bucket is unspecified.
pub type Bucket<K> = FxHashSet<K>;

/// Recycler for emptied buckets.
#[derive(Debug)]
pub struct BucketPool<K> {
    spares: Vec<Bucket<K>>,
}

impl<K> BucketPool<K> {
    /// Keep at most this many spares; beyond that, returned buckets are
    /// simply dropped.
    const MAX_SPARES: usize = 32;

    pub fn new() -> Self {
        Self { spares: Vec::new() }
    }

    /// Take a spare bucket, or allocate a fresh one if the pool is empty.
    pub fn take(&mut self) -> Bucket<K> {
        self.spares.pop().unwrap_or_default()
    }

    /// Return a bucket to the pool.  The bucket is cleared here, so callers
    /// may hand back partially drained sets.
    pub fn put(&mut self, mut bucket: Bucket<K>) {
        if self.spares.len() < Self::MAX_SPARES {
            bucket.clear();
            self.spares.push(bucket);
        }
    }

    /// Number of parked spare buckets.
    pub fn spares(&self) -> usize {
        self.spares.len()
    }
}

impl<K> Default for BucketPool<K> {
    fn default() -> Self {
        Self::new()
    }
}
