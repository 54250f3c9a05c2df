//! `minder-sched` — simulation-date callback schedulers.
//!
//! # Crate layout
//!
//! | Module        | Contents                                        |
//! |---------------|-------------------------------------------------|
//! | [`bucket`]    | `Bucket<K>`, `BucketPool<K>`                    |
//! | [`one_shot`]  | `DateMinder`, `DateSink`                        |
//! | [`recurring`] | `RecurringDateMinder`, `RecurringCtl`           |
//! | [`error`]     | `MinderError`, `MinderResult<T>`                |
//!
//! # Three-set reconciliation (summary)
//!
//! Each scheduler keeps a sorted `active` index plus `to_add`/`to_remove`
//! staging sets.  Callbacks fired during `process_due` may re-enter the
//! scheduler that is firing them; those mutations land in the staging sets
//! and are promoted at the start of the *next* call — adds first, then
//! removes, then firing.  This is what makes an add-then-remove within one
//! processing window a net no-op, and what stops a self-rescheduling
//! callback from being considered due again in the pass that staged it.
//!
//! # Catch-up
//!
//! The driving clock can land several ticks ahead of the last processed
//! date.  `process_due(now, catch_up=true, ..)` then walks every active
//! date ≤ `now` in ascending order, so callbacks whose exact date was
//! stepped over still fire — each exactly once.

pub mod bucket;
pub mod error;
pub mod one_shot;
pub mod recurring;


pub use bucket::{Bucket, BucketPool};
pub use error::{MinderError, MinderResult};
pub use one_shot::{DateMinder, DateSink};
pub use recurring::{RecurringCtl, RecurringDateMinder};
