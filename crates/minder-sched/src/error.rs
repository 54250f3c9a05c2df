//! Scheduler error type.
//!
//! Every variant is a logic error in a calling subsystem, never an
//! environmental failure.  There is no recoverable path: callers fail fast
//! so the defect is diagnosed at its call site instead of silently
//! desynchronizing simulation state.

use minder_core::{ClientId, RecurringId, SimDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MinderError {
    /// The date being registered is not strictly after the current date.
    #[error("date {date} is not after the current date {now}")]
    InvalidDate { date: SimDate, now: SimDate },

    #[error("client {client} has no registration at {date}")]
    UnknownClient { date: SimDate, client: ClientId },

    #[error("client {client} is already registered at {date}")]
    DuplicateClient { date: SimDate, client: ClientId },

    #[error("unknown or unscheduled recurring registration {0}")]
    UnknownRecurring(RecurringId),

    #[error("recurring registration {0} is already scheduled")]
    DuplicateRecurring(RecurringId),
}

pub type MinderResult<T> = Result<T, MinderError>;
