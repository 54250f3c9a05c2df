//! `TickDriver` — owns the clock, both schedulers, and the client registry.
//!
//! The driver is the only place the clock and the schedulers meet: every
//! scheduling convenience method threads `clock.now()` into the scheduler
//! call, and every clock advance immediately runs due processing for the
//! landing date.  Skipping ticks (`advance(n)` with `n > 1`) automatically
//! enables the catch-up walk so stepped-over dates still fire.

use minder_core::{ClientId, RecurringId, SimClock, SimDate, SimSpan};
use minder_sched::{DateMinder, MinderError, RecurringDateMinder};
use rustc_hash::FxHashMap;

use crate::client::MinderClient;
use crate::error::{DriverError, DriverResult};

/// What one clock advance dispatched.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TickReport {
    /// The date the clock landed on.
    pub now: SimDate,
    /// Whether the advance skipped ticks and ran the catch-up walk.
    pub caught_up: bool,
    /// One-shot callbacks fired.
    pub dates_fired: usize,
    /// Recurring callbacks fired.
    pub recurring_fired: usize,
}

/// Ties a [`SimClock`] to both schedulers and dispatches due callbacks to
/// registered [`MinderClient`]s.
pub struct TickDriver {
    clock: SimClock,
    dates: DateMinder,
    recurring: RecurringDateMinder,
    clients: FxHashMap<ClientId, Box<dyn MinderClient>>,
    /// Next client id to hand out; ids are never reused.
    next_client: u32,
}

impl TickDriver {
    pub fn new(start: SimDate) -> Self {
        Self {
            clock: SimClock::new(start),
            dates: DateMinder::new(),
            recurring: RecurringDateMinder::new(),
            clients: FxHashMap::default(),
            next_client: 0,
        }
    }

    // ── Clients ───────────────────────────────────────────────────────────

    /// Register a subsystem and hand back its id.
    pub fn register_client(&mut self, handler: Box<dyn MinderClient>) -> ClientId {
        let id = ClientId(self.next_client);
        self.next_client += 1;
        self.clients.insert(id, handler);
        id
    }

    /// Tear a subsystem down: drop its handler and purge every registration
    /// it owns from both schedulers, so nothing can fire into a dead object.
    pub fn unregister_client(&mut self, id: ClientId) -> DriverResult<()> {
        if self.clients.remove(&id).is_none() {
            return Err(DriverError::UnknownClient(id));
        }
        self.dates.purge_client(id);
        self.recurring.purge_client(id);
        Ok(())
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    /// The date the clock is currently on.
    pub fn now(&self) -> SimDate {
        self.clock.now()
    }

    /// Register a one-shot callback for `client` at `date`.
    pub fn schedule(&mut self, date: SimDate, client: ClientId) -> DriverResult<()> {
        if !self.clients.contains_key(&client) {
            return Err(DriverError::UnknownClient(client));
        }
        self.dates.add(self.clock.now(), date, client)?;
        Ok(())
    }

    /// Cancel a one-shot registration.
    pub fn cancel(&mut self, date: SimDate, client: ClientId) -> DriverResult<()> {
        self.dates.remove(self.clock.now(), date, client)?;
        Ok(())
    }

    /// Create a recurring registration for `client` and schedule it; the
    /// first fire lands one (clamped) span from now.
    pub fn recur(&mut self, client: ClientId, every: SimSpan) -> DriverResult<RecurringId> {
        if !self.clients.contains_key(&client) {
            return Err(DriverError::UnknownClient(client));
        }
        let reg = self.recurring.register(client, every);
        self.recurring.add(self.clock.now(), reg)?;
        Ok(reg)
    }

    /// Stop a recurring registration; its token stays valid for a later
    /// [`resume_recurring`][Self::resume_recurring].
    pub fn cancel_recurring(&mut self, reg: RecurringId) -> DriverResult<()> {
        self.recurring.remove(reg)?;
        Ok(())
    }

    /// Re-schedule a previously cancelled recurring registration; the next
    /// fire lands one span from now.
    pub fn resume_recurring(&mut self, reg: RecurringId) -> DriverResult<()> {
        self.recurring.add(self.clock.now(), reg)?;
        Ok(())
    }

    /// Read access to the one-shot scheduler.
    pub fn dates(&self) -> &DateMinder {
        &self.dates
    }

    /// Read access to the recurring scheduler.
    pub fn recurring(&self) -> &RecurringDateMinder {
        &self.recurring
    }

    // ── Advancing ─────────────────────────────────────────────────────────

    /// Advance the clock by one tick and dispatch callbacks due on it.
    pub fn step(&mut self) -> DriverResult<TickReport> {
        self.advance(1)
    }

    /// Advance the clock by `ticks` and dispatch.  Advancing by more than
    /// one tick skips intermediate dates, so due processing runs with
    /// catch-up: stepped-over dates fire on the landing tick, oldest first.
    pub fn advance(&mut self, ticks: u64) -> DriverResult<TickReport> {
        if ticks == 0 {
            return Err(DriverError::ZeroAdvance);
        }
        let now = self.clock.advance_by(ticks);
        self.dispatch(now, ticks > 1)
    }

    /// Run both schedulers' due processing for `now`, one-shots first.
    ///
    /// While one scheduler is firing, callbacks reach it through its staged
    /// reentrant surface and reach the *other* scheduler directly.
    fn dispatch(&mut self, now: SimDate, catch_up: bool) -> DriverResult<TickReport> {
        let Self { dates, recurring, clients, .. } = self;

        let dates_fired = dates.process_due(now, catch_up, |date, client, sink| {
            let handler = clients
                .get_mut(&client)
                .ok_or(MinderError::UnknownClient { date, client })?;
            handler.on_date(client, date, sink, recurring)
        })?;

        let recurring_fired = recurring.process_due(now, catch_up, |date, reg, client, ctl| {
            let handler = clients
                .get_mut(&client)
                .ok_or(MinderError::UnknownClient { date, client })?;
            handler.on_recurring(client, date, reg, ctl, dates)
        })?;

        Ok(TickReport { now, caught_up: catch_up, dates_fired, recurring_fired })
    }
}
