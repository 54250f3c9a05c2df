//! `RecurringDateMinder` — fire, then automatically reschedule.
//!
//! A registration is an opaque [`RecurringId`] binding one client to one
//! fixed [`SimSpan`].  After the registration fires, the scheduler
//! immediately re-inserts it at `fired_date + span` — measured from the
//! date that fired, never from the driving clock — unless the callback
//! cancelled it.  Under catch-up the walk pops due dates in ascending
//! order, so a registration skipped over several periods fires once per
//! missed period before the walk completes.
//!
//! # Registration state machine
//!
//! ```text
//! Unscheduled ──add──▶ Pending ──reconcile──▶ Active ──due──▶ Firing
//!      ▲                  │                      │              │
//!      │                  │                      │      ┌───────┴────────┐
//!      └─────remove───────┴──────────────────────┘   cancelled       otherwise
//!                                                    in own cb:      re-insert at
//!                                                    Unscheduled     fired + span
//! ```
//!
//! Spans are clamped to at least one tick at registration, so a re-fire
//! date is always strictly after the fired date and the catch-up walk
//! always terminates.

use std::collections::BTreeMap;

use minder_core::{ClientId, RecurringId, SimDate, SimSpan};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::bucket::{Bucket, BucketPool};
use crate::error::{MinderError, MinderResult};

// ── Registration table ────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum RegState {
    /// Registered but not scheduled; `add` is legal.
    Unscheduled,
    /// Staged in `to_add`; promoted to `Active` at the next reconcile.
    Pending,
    /// In the active index, waiting for its next fire date.
    Active,
    /// Its callback is executing right now.
    Firing,
}

/// One client ↔ span binding.  The id is the identity: two registrations
/// with the same client and span are still distinct schedules.
#[derive(Debug)]
struct Registration {
    client: ClientId,
    /// Fixed re-fire span, clamped to ≥ one tick at registration.
    every: SimSpan,
    /// Date this registration next fires; `UNSET` while unscheduled.
    next_fire: SimDate,
    state: RegState,
}

fn insert_registration(
    table: &mut FxHashMap<RecurringId, Registration>,
    next_id: &mut u32,
    client: ClientId,
    every: SimSpan,
) -> RecurringId {
    let id = RecurringId(*next_id);
    *next_id += 1;
    table.insert(
        id,
        Registration {
            client,
            every: every.clamped(),
            next_fire: SimDate::UNSET,
            state: RegState::Unscheduled,
        },
    );
    id
}

/// Stage `id` for scheduling at `now + every`.  Shared by the external
/// [`RecurringDateMinder::add`] and the in-callback [`RecurringCtl::add`].
fn schedule(
    table: &mut FxHashMap<RecurringId, Registration>,
    to_add: &mut Vec<RecurringId>,
    to_remove: &mut FxHashSet<RecurringId>,
    now: SimDate,
    id: RecurringId,
) -> MinderResult<()> {
    let Some(reg) = table.get_mut(&id) else {
        return Err(MinderError::UnknownRecurring(id));
    };
    // A re-add while pending removal cancels the removal; the registration
    // keeps its current schedule.
    if to_remove.remove(&id) {
        return Ok(());
    }
    if reg.state != RegState::Unscheduled {
        return Err(MinderError::DuplicateRecurring(id));
    }
    reg.next_fire = now + reg.every;
    reg.state = RegState::Pending;
    to_add.push(id);
    Ok(())
}

/// Stage a cancellation.  `firing` is the id currently mid-callback, if
/// any; only that id may be removed while in the `Firing` state — the
/// self-cancellation path.
fn cancel(
    table: &FxHashMap<RecurringId, Registration>,
    to_remove: &mut FxHashSet<RecurringId>,
    firing: Option<RecurringId>,
    id: RecurringId,
) -> MinderResult<()> {
    let Some(reg) = table.get(&id) else {
        return Err(MinderError::UnknownRecurring(id));
    };
    if to_remove.contains(&id) {
        // Already cancelled within this window.
        return Err(MinderError::UnknownRecurring(id));
    }
    let removable = match reg.state {
        RegState::Pending | RegState::Active => true,
        RegState::Firing => firing == Some(id),
        RegState::Unscheduled => false,
    };
    if !removable {
        return Err(MinderError::UnknownRecurring(id));
    }
    to_remove.insert(id);
    Ok(())
}

// ── RecurringDateMinder ───────────────────────────────────────────────────────

/// Recurring scheduler: fire, then re-insert one span after the fired date.
///
/// Like [`DateMinder`][crate::DateMinder], it never reads a clock itself;
/// every scheduling operation takes the current date explicitly.
#[derive(Default)]
pub struct RecurringDateMinder {
    table: FxHashMap<RecurringId, Registration>,
    /// Next id to hand out.  Ids are never reused, so a stale handle can
    /// never alias a later registration.
    next_id: u32,
    /// Scheduled registrations, sorted by next fire date.
    active: BTreeMap<SimDate, Bucket<RecurringId>>,
    to_add: Vec<RecurringId>,
    to_remove: FxHashSet<RecurringId>,
    pool: BucketPool<RecurringId>,
}

impl RecurringDateMinder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Tokens ────────────────────────────────────────────────────────────

    /// Create an unscheduled registration binding `client` to a fixed span.
    ///
    /// Spans shorter than one tick are raised to one tick, so a re-fire
    /// date is always strictly after the fired date.
    pub fn register(&mut self, client: ClientId, every: SimSpan) -> RecurringId {
        insert_registration(&mut self.table, &mut self.next_id, client, every)
    }

    /// Destroy a registration outright, whatever state it is in.
    pub fn release(&mut self, id: RecurringId) -> MinderResult<()> {
        let Some(reg) = self.table.remove(&id) else {
            return Err(MinderError::UnknownRecurring(id));
        };
        self.to_remove.remove(&id);
        match reg.state {
            RegState::Active => self.detach_active(reg.next_fire, id),
            RegState::Pending => self.to_add.retain(|&staged| staged != id),
            // Firing is unreachable here: external code never runs while a
            // pass is mid-walk on this single thread.
            RegState::Unscheduled | RegState::Firing => {}
        }
        Ok(())
    }

    /// Release every registration owned by `client`.  Returns the count.
    ///
    /// The owner-teardown path, mirroring
    /// [`DateMinder::purge_client`][crate::DateMinder::purge_client].
    pub fn purge_client(&mut self, client: ClientId) -> usize {
        let owned: Vec<RecurringId> = self
            .table
            .iter()
            .filter(|(_, reg)| reg.client == client)
            .map(|(&id, _)| id)
            .collect();
        let count = owned.len();
        for id in owned {
            let _ = self.release(id);
        }
        count
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// Schedule `id` to first fire at `now + span`.
    ///
    /// Re-adding while the registration is pending removal cancels the
    /// removal; adding an already-scheduled registration is an error.
    pub fn add(&mut self, now: SimDate, id: RecurringId) -> MinderResult<()> {
        schedule(&mut self.table, &mut self.to_add, &mut self.to_remove, now, id)
    }

    /// Cancel a scheduled registration.  The token returns to unscheduled
    /// and may be re-added later; use [`release`][Self::release] to destroy
    /// it instead.
    pub fn remove(&mut self, id: RecurringId) -> MinderResult<()> {
        cancel(&self.table, &mut self.to_remove, None, id)
    }

    // ── Processing ────────────────────────────────────────────────────────

    /// Apply staged mutations, then walk due dates: exactly `now`, or with
    /// `catch_up` every active date ≤ `now` in ascending order.
    ///
    /// A fired registration that was not cancelled from inside its own
    /// callback is re-inserted at `fired_date + span` before the walk moves
    /// on, so under catch-up the walk also reaches re-inserted intermediate
    /// dates ≤ `now` — one fire per missed period, in order.
    ///
    /// Returns the number of callbacks fired; propagates the first callback
    /// error (fail fast, scheduler left mid-pass).
    pub fn process_due<F>(&mut self, now: SimDate, catch_up: bool, mut fire: F) -> MinderResult<usize>
    where
        F: FnMut(SimDate, RecurringId, ClientId, &mut RecurringCtl<'_>) -> MinderResult<()>,
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

    /// Fire every registration in a detached bucket, re-inserting each one
    /// that survives its own callback, then recycle the bucket.
    fn fire_bucket<F>(
        &mut self,
        now: SimDate,
        date: SimDate,
        mut bucket: Bucket<RecurringId>,
        fire: &mut F,
    ) -> MinderResult<usize>
    where
        F: FnMut(SimDate, RecurringId, ClientId, &mut RecurringCtl<'_>) -> MinderResult<()>,
    {
        let mut fired = 0;
        for id in bucket.drain() {
            let client = match self.table.get_mut(&id) {
                Some(reg) => {
                    reg.state = RegState::Firing;
                    reg.client
                }
                // Released mid-window; nothing left to fire.
                None => continue,
            };
            {
                let mut ctl = RecurringCtl {
                    now,
                    firing: id,
                    table: &mut self.table,
                    next_id: &mut self.next_id,
                    to_add: &mut self.to_add,
                    to_remove: &mut self.to_remove,
                };
                fire(date, id, client, &mut ctl)?;
            }
            fired += 1;
            if self.to_remove.remove(&id) {
                // Cancelled during its own callback: back to unscheduled,
                // no re-insert.
                if let Some(reg) = self.table.get_mut(&id) {
                    reg.state = RegState::Unscheduled;
                    reg.next_fire = SimDate::UNSET;
                }
            } else if let Some(reg) = self.table.get_mut(&id) {
                let next = date + reg.every;
                reg.next_fire = next;
                reg.state = RegState::Active;
                self.active
                    .entry(next)
                    .or_insert_with(|| self.pool.take())
                    .insert(id);
            }
        }
        self.pool.put(bucket);
        Ok(fired)
    }

    /// Promote staged mutations: adds first, then removes, so an
    /// add-then-remove staged within one window nets to nothing.
    fn reconcile(&mut self) {
        for id in std::mem::take(&mut self.to_add) {
            let Some(reg) = self.table.get_mut(&id) else {
                continue;
            };
            if reg.state != RegState::Pending {
                continue;
            }
            reg.state = RegState::Active;
            let date = reg.next_fire;
            self.active
                .entry(date)
                .or_insert_with(|| self.pool.take())
                .insert(id);
        }
        for id in std::mem::take(&mut self.to_remove) {
            let Some(reg) = self.table.get_mut(&id) else {
                continue;
            };
            let date = reg.next_fire;
            reg.state = RegState::Unscheduled;
            reg.next_fire = SimDate::UNSET;
            self.detach_active(date, id);
        }
    }

    /// Remove `id` from the active bucket at `date`, recycling the bucket if
    /// it empties.
    fn detach_active(&mut self, date: SimDate, id: RecurringId) {
        let Some(bucket) = self.active.get_mut(&date) else {
            return;
        };
        bucket.remove(&id);
        if bucket.is_empty() {
            if let Some(empty) = self.active.remove(&date) {
                self.pool.put(empty);
            }
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// Earliest active fire date, or `None` when nothing is scheduled.
    pub fn next_date(&self) -> Option<SimDate> {
        self.active.keys().next().copied()
    }

    /// Whether `id` is currently scheduled (pending or active) and not
    /// staged for removal.
    pub fn is_scheduled(&self, id: RecurringId) -> bool {
        if self.to_remove.contains(&id) {
            return false;
        }
        self.table
            .get(&id)
            .is_some_and(|reg| reg.state != RegState::Unscheduled)
    }

    /// Date `id` next fires, if scheduled.
    pub fn next_fire(&self, id: RecurringId) -> Option<SimDate> {
        self.table
            .get(&id)
            .map(|reg| reg.next_fire)
            .filter(|date| date.is_set())
    }

    /// The client a registration is bound to.
    pub fn client_of(&self, id: RecurringId) -> Option<ClientId> {
        self.table.get(&id).map(|reg| reg.client)
    }

    /// The (clamped) re-fire span of a registration.
    pub fn span_of(&self, id: RecurringId) -> Option<SimSpan> {
        self.table.get(&id).map(|reg| reg.every)
    }

    /// Number of active registrations (staged adds excluded).
    pub fn len(&self) -> usize {
        self.active.values().map(Bucket::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

// ── RecurringCtl ──────────────────────────────────────────────────────────────

/// Reentrant surface handed to recurring callbacks while they fire.
///
/// [`add`][Self::add] stages through `to_add`, so a registration scheduled
/// from inside a callback is never considered due within the pass that
/// staged it.  [`remove`][Self::remove] of [`firing`][Self::firing] is the
/// self-cancellation path: the registration will not be re-inserted when
/// its callback returns.
pub struct RecurringCtl<'a> {
    now: SimDate,
    firing: RecurringId,
    table: &'a mut FxHashMap<RecurringId, Registration>,
    next_id: &'a mut u32,
    to_add: &'a mut Vec<RecurringId>,
    to_remove: &'a mut FxHashSet<RecurringId>,
}

impl RecurringCtl<'_> {
    /// The date `process_due` is running for.  Under catch-up this is the
    /// driving clock's date, not the (older) date currently firing.
    pub fn now(&self) -> SimDate {
        self.now
    }

    /// The registration currently firing.
    pub fn firing(&self) -> RecurringId {
        self.firing
    }

    /// Create a new unscheduled registration; same contract as
    /// [`RecurringDateMinder::register`].
    pub fn register(&mut self, client: ClientId, every: SimSpan) -> RecurringId {
        insert_registration(self.table, self.next_id, client, every)
    }

    /// Schedule a registration at `now() + span`; visible from the next
    /// processing pass.
    pub fn add(&mut self, id: RecurringId) -> MinderResult<()> {
        schedule(self.table, self.to_add, self.to_remove, self.now, id)
    }

    /// Cancel a registration.  Cancelling [`firing`][Self::firing] prevents
    /// its automatic re-insert.
    pub fn remove(&mut self, id: RecurringId) -> MinderResult<()> {
        cancel(self.table, self.to_remove, Some(self.firing), id)
    }
}
