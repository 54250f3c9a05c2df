//! Driver error type.

use minder_core::ClientId;
use minder_sched::MinderError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    /// A scheduler rejected an operation, or a callback failed mid-pass.
    #[error(transparent)]
    Minder(#[from] MinderError),

    /// The client id is not registered with this driver.
    #[error("client {0} is not registered with the driver")]
    UnknownClient(ClientId),

    /// `advance` was asked to move the clock by zero ticks.
    #[error("advance must move the clock by at least one tick")]
    ZeroAdvance,
}

pub type DriverResult<T> = Result<T, DriverError>;
