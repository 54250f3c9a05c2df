//! Simulation time model.
//!
//! # Design
//!
//! A `SimDate` is an absolute point on the simulation timeline, counted in
//! integer ticks.  Integer dates keep all schedule arithmetic exact: a
//! callback registered for `now + span` fires at precisely that date, with
//! no floating-point drift over millions of ticks, and comparisons are O(1).
//!
//! The driving clock may *skip* dates when the host frame rate drops; the
//! schedulers compensate with their catch-up walk.  Nothing in this module
//! maps to wall-clock time — the timeline is purely logical.

use std::fmt;
use std::ops::Add;

// ── SimDate ───────────────────────────────────────────────────────────────────

/// An absolute point in simulation time.
///
/// Stored as `u64` to avoid overflow: at one date per simulation tick a u64
/// outlasts any conceivable run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimDate(pub u64);

impl SimDate {
    /// The first representable date.
    pub const ZERO: SimDate = SimDate(0);

    /// Sentinel meaning "no date" — later than every reachable real date.
    /// `Default` returns this so uninitialized dates are visibly unset.
    pub const UNSET: SimDate = SimDate(u64::MAX);

    /// `true` for every date except the [`UNSET`][Self::UNSET] sentinel.
    #[inline]
    pub fn is_set(self) -> bool {
        self != Self::UNSET
    }

    /// Span elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: SimDate) -> SimSpan {
        SimSpan(self.0 - earlier.0)
    }
}

impl Default for SimDate {
    #[inline]
    fn default() -> Self {
        Self::UNSET
    }
}

impl Add<SimSpan> for SimDate {
    type Output = SimDate;
    #[inline]
    fn add(self, rhs: SimSpan) -> SimDate {
        SimDate(self.0 + rhs.0)
    }
}

impl fmt::Display for SimDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_set() {
            write!(f, "D{}", self.0)
        } else {
            f.write_str("D-unset")
        }
    }
}

// ── SimSpan ───────────────────────────────────────────────────────────────────

/// An elapsed span of simulation time, in ticks.
///
/// Spans are used to compute a future [`SimDate`] from a base one:
/// `base + span`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimSpan(pub u64);

impl SimSpan {
    pub const ZERO: SimSpan = SimSpan(0);

    /// The smallest positive increment — one tick.
    pub const ONE: SimSpan = SimSpan(1);

    /// This span raised to at least one tick.
    ///
    /// Recurring schedules use the clamped span so that a re-fire date is
    /// always strictly after the date that just fired.
    #[inline]
    pub fn clamped(self) -> SimSpan {
        SimSpan(self.0.max(1))
    }

    #[inline]
    pub fn ticks(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SimSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}t", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The advancing simulation clock.
///
/// Passed explicitly to whoever needs the current date — there is no global
/// clock instance, which keeps the schedulers unit-testable against any
/// starting position.  The clock only tracks where the simulation is;
/// dispatching due callbacks is the driver's job.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    current: SimDate,
}

impl SimClock {
    /// Create a clock positioned at `start`.
    pub fn new(start: SimDate) -> Self {
        Self { current: start }
    }

    /// The date the clock is currently on.
    #[inline]
    pub fn now(&self) -> SimDate {
        self.current
    }

    /// Advance by one tick and return the new date.
    #[inline]
    pub fn advance(&mut self) -> SimDate {
        self.advance_by(1)
    }

    /// Advance by `ticks` at once and return the landing date.
    ///
    /// `ticks > 1` means intermediate dates were skipped; due processing for
    /// the landing date should then run with catch-up enabled.
    ///
    /// # Panics
    /// Panics in debug mode if `ticks == 0` — the clock never moves backward
    /// or stands still across an advance.
    pub fn advance_by(&mut self, ticks: u64) -> SimDate {
        debug_assert!(ticks > 0, "clock advance must move at least one tick");
        self.current = SimDate(self.current.0 + ticks);
        self.current
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.current)
    }
}
