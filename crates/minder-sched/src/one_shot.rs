//! `DateMinder` — the one-shot simulation-date scheduler.
//!
//! Clients register a `(date, client)` pair and are fired back exactly once
//! when the date is reached, then forgotten.  Because a firing callback may
//! itself add or remove registrations on the very scheduler invoking it,
//! mutations never touch the `active` index directly: they are staged in
//! `to_add`/`to_remove` and reconciled at the start of the next
//! [`process_due`][DateMinder::process_due] call.

use std::collections::BTreeMap;

use minder_core::{ClientId, SimDate};
use rustc_hash::FxHashMap;

use crate::bucket::{Bucket, BucketPool};
use crate::error::{MinderError, MinderResult};

// ── Staging sets ──────────────────────────────────────────────────────────────

/// Mutations staged since the last processing pass.
///
/// Kept as a separate struct so a [`DateSink`] can borrow it mutably while
/// `process_due` holds the rest of the scheduler.
#[derive(Default)]
struct PendingSets {
    to_add: FxHashMap<SimDate, Bucket<ClientId>>,
    to_remove: FxHashMap<SimDate, Bucket<ClientId>>,
}

impl PendingSets {
    /// Stage an add.  `active` is consulted for duplicate detection only.
    fn stage_add(
        &mut self,
        date: SimDate,
        client: ClientId,
        active: &BTreeMap<SimDate, Bucket<ClientId>>,
    ) -> MinderResult<()> {
        // A re-add while the same pair is pending removal cancels the
        // removal — the pair is still tracked in active or to_add, so
        // nothing else changes.
        if unstage(&mut self.to_remove, date, client) {
            return Ok(());
        }
        let tracked = active.get(&date).is_some_and(|b| b.contains(&client))
            || self.to_add.get(&date).is_some_and(|b| b.contains(&client));
        if tracked {
            return Err(MinderError::DuplicateClient { date, client });
        }
        self.to_add.entry(date).or_default().insert(client);
        Ok(())
    }

    /// Stage a removal of a tracked `(date, client)` pair.
    fn stage_remove(
        &mut self,
        date: SimDate,
        client: ClientId,
        active: &BTreeMap<SimDate, Bucket<ClientId>>,
    ) -> MinderResult<()> {
        if self.to_remove.get(&date).is_some_and(|b| b.contains(&client)) {
            // Already cancelled within this window.
            return Err(MinderError::UnknownClient { date, client });
        }
        let tracked = active.get(&date).is_some_and(|b| b.contains(&client))
            || self.to_add.get(&date).is_some_and(|b| b.contains(&client));
        if !tracked {
            return Err(MinderError::UnknownClient { date, client });
        }
        self.to_remove.entry(date).or_default().insert(client);
        Ok(())
    }
}

/// Remove `client` from a staged set at `date`, dropping the date entry if
/// it empties.  Returns whether the client was present.
fn unstage(
    staged: &mut FxHashMap<SimDate, Bucket<ClientId>>,
    date: SimDate,
    client: ClientId,
) -> bool {
    let Some(bucket) = staged.get_mut(&date) else {
        return false;
    };
    let present = bucket.remove(&client);
    if present && bucket.is_empty() {
        staged.remove(&date);
    }
    present
}

// ── DateMinder ────────────────────────────────────────────────────────────────

/// One-shot scheduler: fire each registration at most once, then forget it.
///
/// The scheduler never reads a clock itself.  Every operation takes the
/// current date explicitly, so it can be driven by any clock — including a
/// fake one in tests.
#[derive(Default)]
pub struct DateMinder {
    /// Currently scheduled registrations, sorted by date.  The sorted index
    /// makes the catch-up walk an in-order pop instead of a per-call re-sort.
    active: BTreeMap<SimDate, Bucket<ClientId>>,
    pending: PendingSets,
    pool: BucketPool<ClientId>,
}

impl DateMinder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register `client` to be fired exactly once at `date`.
    ///
    /// `date` must be strictly after `now`.  If the same pair is pending
    /// removal from earlier in this processing window, the removal is
    /// cancelled instead of a duplicate being created.
    pub fn add(&mut self, now: SimDate, date: SimDate, client: ClientId) -> MinderResult<()> {
        if date <= now {
            return Err(MinderError::InvalidDate { date, now });
        }
        self.pending.stage_add(date, client, &self.active)
    }

    /// Cancel a pending registration.
    ///
    /// `date` must not be strictly before `now`.  Cancelling a date that the
    /// current pass is mid-firing is only possible from inside a callback,
    /// via [`DateSink::remove`], which waives the past-date check.
    pub fn remove(&mut self, now: SimDate, date: SimDate, client: ClientId) -> MinderResult<()> {
        if date < now {
            return Err(MinderError::InvalidDate { date, now });
        }
        self.pending.stage_remove(date, client, &self.active)
    }

    /// Drop every registration owned by `client` across the active index and
    /// both staging sets.  Returns how many tracked entries went away.
    ///
    /// This is the owner-teardown path: call it when the owning subsystem
    /// goes away, so no callback can fire into a dead object.
    pub fn purge_client(&mut self, client: ClientId) -> usize {
        let mut purged = 0;
        let mut emptied: Vec<SimDate> = Vec::new();
        for (&date, bucket) in self.active.iter_mut() {
            if bucket.remove(&client) {
                purged += 1;
                if bucket.is_empty() {
                    emptied.push(date);
                }
            }
        }
        for date in emptied {
            if let Some(empty) = self.active.remove(&date) {
                self.pool.put(empty);
            }
        }
        self.pending.to_add.retain(|_, bucket| {
            if bucket.remove(&client) {
                purged += 1;
            }
            !bucket.is_empty()
        });
        self.pending.to_remove.retain(|_, bucket| {
            bucket.remove(&client);
            !bucket.is_empty()
        });
        purged
    }

    // ── Processing ────────────────────────────────────────────────────────

    /// Apply staged mutations, then fire every client registered for `now` —
    /// and, with `catch_up`, every client at a strictly older active date
    /// first, in ascending date order.
    ///
    /// Returns the number of callbacks fired.  A callback error aborts the
    /// pass immediately; since every [`MinderError`] is a programmer error,
    /// the scheduler is left mid-pass and the run should be treated as
    /// defective rather than resumed.
    pub fn process_due<F>(&mut self, now: SimDate, catch_up: bool, mut fire: F) -> MinderResult<usize>
    where
        F: FnMut(SimDate, ClientId, &mut DateSink<'_>) -> MinderResult<()>,
    {
        self.reconcile();
        let mut fired = 0;
        if catch_up {
            while let Some(entry) = self.active.first_entry() {
                let date = *entry.key();
                if date > now {
                    break;
                }
                let bucket = entry.remove();
                fired += self.fire_bucket(now, date, bucket, &mut fire)?;
            }
        } else if let Some(bucket) = self.active.remove(&now) {
            fired += self.fire_bucket(now, now, bucket, &mut fire)?;
        }
        Ok(fired)
    }

    /// Fire every client in a detached bucket, then recycle the bucket.
    fn fire_bucket<F>(
        &mut self,
        now: SimDate,
        date: SimDate,
        mut bucket: Bucket<ClientId>,
        fire: &mut F,
    ) -> MinderResult<usize>
    where
        F: FnMut(SimDate, ClientId, &mut DateSink<'_>) -> MinderResult<()>,
    {
        let mut fired = 0;
        for client in bucket.drain() {
            let mut sink = DateSink {
                now,
                firing: (date, client),
                active: &self.active,
                pending: &mut self.pending,
            };
            fire(date, client, &mut sink)?;
            fired += 1;
        }
        self.pool.put(bucket);
        Ok(fired)
    }

    /// Promote staged mutations into the active index: adds first, then
    /// removes, so an add-then-remove staged within one window nets to
    /// nothing.
    fn reconcile(&mut self) {
        for (date, mut adds) in self.pending.to_add.drain() {
            let bucket = self.active.entry(date).or_insert_with(|| self.pool.take());
            for client in adds.drain() {
                let fresh = bucket.insert(client);
                debug_assert!(fresh, "duplicate staged add for {client} at {date}");
            }
        }
        for (date, removes) in self.pending.to_remove.drain() {
            // A missing bucket is fine: the entry fired during the pass in
            // which the removal was staged.
            let Some(bucket) = self.active.get_mut(&date) else {
                continue;
            };
            for client in &removes {
                bucket.remove(client);
            }
            if bucket.is_empty() {
                if let Some(empty) = self.active.remove(&date) {
                    self.pool.put(empty);
                }
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Earliest active date, or `None` when nothing is scheduled.  Staged
    /// adds are not visible until the next processing pass.
    pub fn next_date(&self) -> Option<SimDate> {
        self.active.keys().next().copied()
    }

    /// Whether `(date, client)` is tracked — active or staged for add — and
    /// not staged for removal.
    pub fn is_scheduled(&self, date: SimDate, client: ClientId) -> bool {
        if self.pending.to_remove.get(&date).is_some_and(|b| b.contains(&client)) {
            return false;
        }
        self.active.get(&date).is_some_and(|b| b.contains(&client))
            || self.pending.to_add.get(&date).is_some_and(|b| b.contains(&client))
    }

    /// Number of active registrations (staged adds excluded).
    pub fn len(&self) -> usize {
        self.active.values().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

// ── DateSink ──────────────────────────────────────────────────────────────────

/// Reentrant mutation surface handed to callbacks while they fire.
///
/// Mutations staged here become visible at the start of the *next*
/// processing pass, so a callback that reschedules itself can never be
/// considered due again within the pass currently firing it.
pub struct DateSink<'a> {
    now: SimDate,
    firing: (SimDate, ClientId),
    active: &'a BTreeMap<SimDate, Bucket<ClientId>>,
    pending: &'a mut PendingSets,
}

impl DateSink<'_> {
    /// The date `process_due` is running for.  Under catch-up this is the
    /// driving clock's date, not the (older) date currently firing.
    pub fn now(&self) -> SimDate {
        self.now
    }

    /// Stage a registration; same contract as [`DateMinder::add`].
    pub fn add(&mut self, date: SimDate, client: ClientId) -> MinderResult<()> {
        if date <= self.now {
            return Err(MinderError::InvalidDate { date, now: self.now });
        }
        self.pending.stage_add(date, client, self.active)
    }

    /// Stage a cancellation; same contract as [`DateMinder::remove`], with
    /// two differences that only make sense mid-pass:
    ///
    /// - past dates are accepted, since a callback may legitimately cancel
    ///   an entry at a date the catch-up walk has not reached yet (the
    ///   removal lands at the start of the next pass, so such an entry still
    ///   fires if the current walk reaches it first);
    /// - removing the exact entry currently firing is a no-op — it has
    ///   already been consumed.
    pub fn remove(&mut self, date: SimDate, client: ClientId) -> MinderResult<()> {
        if (date, client) == self.firing {
            return Ok(());
        }
        self.pending.stage_remove(date, client, self.active)
    }
}
