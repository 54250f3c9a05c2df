//! `minder-sim` — the tick driver tying clock, schedulers, and clients.
//!
//! # Crate layout
//!
//! | Module     | Contents                           |
//! |------------|------------------------------------|
//! | [`client`] | `MinderClient` trait               |
//! | [`driver`] | `TickDriver`, `TickReport`         |
//! | [`error`]  | `DriverError`, `DriverResult<T>`   |
//!
//! A simulation loop holds one [`TickDriver`], registers its subsystems as
//! [`MinderClient`]s, schedules dates for them, and calls
//! [`step`][TickDriver::step] (or [`advance`][TickDriver::advance] when the
//! host skipped frames) once per simulation tick.  Everything due on the
//! landing date is dispatched before the call returns.

pub mod client;
pub mod driver;
pub mod error;


pub use client::MinderClient;
pub use driver::{TickDriver, TickReport};
pub use error::{DriverError, DriverResult};
