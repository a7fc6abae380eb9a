//! This crate is used by the internal tasks of `zmalarmd`.
//!
//! It defines the error type shared by every part of the service,
//! the identifiers and paths used to address a monitor's alarm on a
//! ZoneMinder server, and the trait an alarm client implements so
//! the trigger logic can be exercised without a real server.

use async_trait::async_trait;

mod types;

pub mod alarm;
pub mod request;

// Pull types down to the `zmalarm-api` namespace.

pub use types::monitor::MonitorId;
pub use types::Error;

/// A specialization of `std::result::Result<>` where the error value
/// is `types::Error`.

pub type Result<T> = std::result::Result<T, Error>;

/// Defines the trait that a connection to a ZoneMinder server needs
/// to implement.
///
/// The trigger logic only ever needs two things from the server: a
/// way to (re)authenticate and a way to issue a request against one
/// of the alarm endpoints. The replies of all three alarm endpoints
/// (status, on and off) share the same shape so a single method
/// covers them.

#[async_trait]
pub trait AlarmClient: Send + Sync {
    /// Authenticates with the server. Implementations should make
    /// this idempotent; it gets called at the start of every trigger
    /// request.
    ///
    /// Returns `Error::AuthenticationError` if the server rejected
    /// the credentials, or another remote error if the server
    /// couldn't be reached.

    async fn login(&self) -> Result<()>;

    /// Sends a request to the API endpoint at `path`, which is
    /// relative to the server's base URL. Use `alarm::Command::path()`
    /// to build the paths for the alarm endpoints.

    async fn get_state(&self, path: &str) -> Result<alarm::State>;
}
