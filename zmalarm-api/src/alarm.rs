//! Describes the alarm endpoints of the ZoneMinder API.
//!
//! Each monitor has three endpoints: one reports the alarm status
//! and two force the alarm on or off. All of them reply with a JSON
//! object holding a `status` field.

use crate::MonitorId;
use std::fmt;

/// The status ZoneMinder reports for a monitor that isn't alarmed.
pub const STATUS_INACTIVE: &str = "0";

/// Selects one of a monitor's alarm endpoints.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    On,
    Off,
}

impl Command {
    fn as_str(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::On => "on",
            Command::Off => "off",
        }
    }

    /// Returns the API path, relative to the server's base URL, that
    /// applies this command to monitor `id`.
    pub fn path(&self, id: MonitorId) -> String {
        format!(
            "api/monitors/alarm/id:{}/command:{}.json",
            id,
            self.as_str()
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The reply from an alarm endpoint.
///
/// ZoneMinder isn't consistent about the type of the `status` field
/// (some versions send a string, others a number) so clients store
/// it as a string. It's `None` if the reply didn't contain the
/// field.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct State {
    pub status: Option<String>,
}

impl State {
    pub fn new(status: impl Into<String>) -> Self {
        State {
            status: Some(status.into()),
        }
    }

    /// Returns `true` if the reply says the alarm is off. A reply
    /// without a status isn't considered inactive.
    pub fn is_inactive(&self) -> bool {
        self.status.as_deref() == Some(STATUS_INACTIVE)
    }
}
