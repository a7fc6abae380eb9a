//! This module defines the requests that front ends use to ask the
//! core of `zmalarmd` to trigger an alarm.

use crate::{MonitorId, Result};
use serde_derive::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// The payload of a "trigger alarm" call: the name of a configured
/// ZoneMinder host and the monitor whose alarm should be raised.
/// Deserializing it checks that both fields are present and that
/// `id` is a positive integer.

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerAlarm {
    pub name: Arc<str>,
    pub id: MonitorId,
}

/// Defines the requests that can be sent to core.
#[derive(Debug)]
pub enum Request {
    /// Raises (or keeps raised) the alarm of a monitor. There is no
    /// reply; the outcome is only logged.
    TriggerAlarm { host: Arc<str>, monitor: MonitorId },
}

/// A handle which is used to send requests to the core of
/// `zmalarmd`. Front ends are given a handle to be used throughout
/// their life.
///
/// This type wraps the `mpsc::Sender<>` and defines a set of helper
/// methods to send requests.
#[derive(Clone)]
pub struct RequestChan {
    req_chan: mpsc::Sender<Request>,
}

impl RequestChan {
    pub fn new(req_chan: mpsc::Sender<Request>) -> Self {
        RequestChan { req_chan }
    }

    /// Queues a trigger request. This returns as soon as core has
    /// accepted the request; it doesn't wait for the alarm to be
    /// raised. An error is only returned if core has exited.
    pub async fn trigger_alarm(
        &self,
        host: Arc<str>,
        monitor: MonitorId,
    ) -> Result<()> {
        Ok(self
            .req_chan
            .send(Request::TriggerAlarm { host, monitor })
            .await?)
    }
}
