use crate::{types::Error, Result};
use serde_derive::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

/// Identifies a monitor (a camera and its alarm channel) on a
/// ZoneMinder server. ZoneMinder numbers its monitors starting at 1,
/// so a `MonitorId` is always a positive integer.
///
/// When deserialized, the value may be an integer or a string holding
/// one (automations that build the id from a template send strings.)
/// Zero, negative and out-of-range values are rejected.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "IdField")]
pub struct MonitorId(NonZeroU32);

#[derive(Deserialize)]
#[serde(untagged)]
enum IdField {
    Integer(i64),
    Text(String),
}

impl MonitorId {
    pub fn create(id: i64) -> Result<Self> {
        u32::try_from(id)
            .ok()
            .and_then(NonZeroU32::new)
            .map(MonitorId)
            .ok_or(Error::InvArgument("monitor id must be a positive integer"))
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

// This trait is defined so that the TOML and JSON parsers will use it
// to validate the `id` fields.

impl TryFrom<IdField> for MonitorId {
    type Error = Error;

    fn try_from(id: IdField) -> Result<Self> {
        match id {
            IdField::Integer(v) => MonitorId::create(v),
            IdField::Text(v) => v.parse(),
        }
    }
}

// This trait allows one to use `.parse::<MonitorId>()`.

impl FromStr for MonitorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map_err(|e| Error::ParseError(format!("bad monitor id -- {}", e)))
            .and_then(MonitorId::create)
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
