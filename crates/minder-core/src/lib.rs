//! `minder-core` — foundational value types for the minder scheduling
//! workspace.
//!
//! This crate is a dependency of every other `minder-*` crate.  It has no
//! mandatory external dependencies (only optional `serde`).
//!
//! # What lives here
//!
//! | Module   | Contents                                  |
//! |----------|-------------------------------------------|
//! | [`ids`]  | `ClientId`, `RecurringId`                 |
//! | [`time`] | `SimDate`, `SimSpan`, `SimClock`          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                   |
//! |---------|----------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.|

pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use ids::{ClientId, RecurringId};
pub use time::{SimClock, SimDate, SimSpan};
