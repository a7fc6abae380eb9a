//! Keeps the alarm countdowns of one ZoneMinder host.
//!
//! Each monitor that's being triggered or counted down has an entry
//! holding the number of seconds left before its alarm gets turned
//! off, or nothing if no countdown is running. Idle entries are
//! dropped once nobody uses them. Every entry sits behind its
//! own async mutex. The trigger logic and the countdown task lock an
//! entry for the whole of a check-then-act sequence, so those
//! sequences are atomic per monitor while different monitors never
//! wait on each other.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use zmalarm_api::MonitorId;

/// The remaining time, in seconds, of a monitor's alarm. `None`
/// means the monitor is idle.

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Countdown(Option<u32>);

impl Countdown {
    pub fn remaining(&self) -> Option<u32> {
        self.0
    }

    pub fn is_active(&self) -> bool {
        self.0.is_some()
    }

    pub fn set(&mut self, secs: u32) {
        self.0 = Some(secs)
    }

    /// Adds `secs` to a running countdown and returns the new
    /// remaining time. Nothing changes, and `None` is returned, if
    /// the countdown isn't running.
    pub fn extend(&mut self, secs: u32) -> Option<u32> {
        self.0 = self.0.map(|v| v.saturating_add(secs));
        self.0
    }

    /// Counts down one second. The value never goes below zero. An
    /// idle countdown stays idle.
    pub fn decrement(&mut self) -> Option<u32> {
        self.0 = self.0.map(|v| v.saturating_sub(1));
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = None
    }
}

pub type Entry = Arc<Mutex<Countdown>>;

#[derive(Default)]
pub struct Registry {
    entries: Mutex<HashMap<MonitorId, Entry>>,
}

impl Registry {
    /// Returns the entry for `id`, creating an idle one if the
    /// monitor hasn't been seen before.
    pub async fn get_or_init(&self, id: MonitorId) -> Entry {
        self.entries.lock().await.entry(id).or_default().clone()
    }

    /// Drops the entry of an idle monitor so the table doesn't grow
    /// with every monitor ever triggered. `entry` has to be the
    /// caller's handle, locked and idle. If anyone else holds a
    /// handle to it, it's kept.
    pub async fn prune(&self, id: MonitorId, entry: &Entry) {
        let mut entries = self.entries.lock().await;

        // New handles are only given out while `entries` is locked,
        // so the count can't grow under us.

        if Arc::strong_count(entry) == 2
            && entries.get(&id).is_some_and(|e| Arc::ptr_eq(e, entry))
        {
            entries.remove(&id);
        }
    }

    #[cfg(test)]
    pub async fn remaining(&self, id: MonitorId) -> Option<u32> {
        let entry = self.entries.lock().await.get(&id).cloned();

        match entry {
            Some(entry) => entry.lock().await.remaining(),
            None => None,
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
