//! The table of configured ZoneMinder hosts.

use super::{ttl, zm};
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use zmalarm_api::{AlarmClient, Error, MonitorId, Result};

/// Everything needed to manage the alarms of one ZoneMinder server:
/// its client connection, the time-to-live given to each trigger and
/// the countdowns of its monitors.

pub struct Host {
    pub name: Arc<str>,
    pub ttl: u32,
    pub client: Arc<dyn AlarmClient>,
    pub countdowns: ttl::Registry,
}

impl Host {
    pub fn new(name: Arc<str>, ttl: u32, client: Arc<dyn AlarmClient>) -> Self {
        Host {
            name,
            ttl,
            client,
            countdowns: ttl::Registry::default(),
        }
    }
}

/// Maps host names to their `Host` registration. The table is
/// built at start-up and never changes afterwards.

#[derive(Default)]
pub struct HostDb(HashMap<Arc<str>, Arc<Host>>);

impl HostDb {
    /// Builds the table from the `[[host]]` sections of the config.
    pub fn create(cfg: &[zm::config::Params]) -> Result<Self> {
        let mut db = HostDb::default();

        for params in cfg {
            let client = zm::Client::new(params)?;

            info!(
                "ZoneMinder host '{}' at {}",
                &params.name,
                params.server_url()
            );

            db.insert(Host::new(
                params.name.clone(),
                params.ttl,
                Arc::new(client),
            ))?
        }
        Ok(db)
    }

    /// Adds a host to the table. Host names have to be unique.
    pub fn insert(&mut self, host: Host) -> Result<()> {
        if self.0.contains_key(&host.name) {
            Err(Error::ConfigError(format!(
                "host '{}' is defined more than once",
                &host.name
            )))
        } else {
            self.0.insert(host.name.clone(), Arc::new(host));
            Ok(())
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Host>> {
        self.0.get(name).cloned()
    }

    /// Triggers the alarm of monitor `id` on the host called `name`.
    pub async fn trigger(
        &self,
        name: &str,
        id: MonitorId,
    ) -> Result<super::trigger::Outcome> {
        match self.get(name) {
            Some(host) => host.trigger(id).await,
            None => Err(Error::UnknownHost(name.to_string())),
        }
    }
}
