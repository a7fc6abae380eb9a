// An in-memory stand-in for a ZoneMinder server, used by the unit
// tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use zmalarm_api::{
    alarm::{self, Command},
    AlarmClient, Error, MonitorId, Result,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub logins: usize,
    pub queries: usize,
    pub on: usize,
    pub off: usize,
}

#[derive(Default)]
struct Server {
    calls: Calls,
    active: HashSet<MonitorId>,
    fail_login: bool,
    fail_status: bool,
    fail_off: bool,
    drop_status: bool,
    gates: HashMap<MonitorId, Arc<Notify>>,
}

#[derive(Default)]
pub struct MockClient(Mutex<Server>);

impl MockClient {
    pub fn new() -> Arc<Self> {
        Arc::new(MockClient::default())
    }

    fn with<T>(&self, f: impl FnOnce(&mut Server) -> T) -> T {
        f(&mut *self.0.lock().unwrap())
    }

    pub fn calls(&self) -> Calls {
        self.with(|s| s.calls)
    }

    pub fn is_active(&self, id: MonitorId) -> bool {
        self.with(|s| s.active.contains(&id))
    }

    pub fn set_active(&self, id: MonitorId, active: bool) {
        self.with(|s| {
            if active {
                s.active.insert(id);
            } else {
                s.active.remove(&id);
            }
        })
    }

    pub fn fail_login(&self, v: bool) {
        self.with(|s| s.fail_login = v)
    }

    pub fn fail_status(&self, v: bool) {
        self.with(|s| s.fail_status = v)
    }

    pub fn fail_off(&self, v: bool) {
        self.with(|s| s.fail_off = v)
    }

    pub fn drop_status(&self, v: bool) {
        self.with(|s| s.drop_status = v)
    }

    // The next status request for `id` doesn't answer until the
    // returned gate is notified.

    pub fn hold_status(&self, id: MonitorId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());

        self.with(|s| s.gates.insert(id, gate.clone()));
        gate
    }
}

#[async_trait]
impl AlarmClient for MockClient {
    async fn login(&self) -> Result<()> {
        self.with(|s| {
            s.calls.logins += 1;
            if s.fail_login {
                Err(Error::AuthenticationError)
            } else {
                Ok(())
            }
        })
    }

    async fn get_state(&self, path: &str) -> Result<alarm::State> {
        // Recover the monitor and command from the path.

        let id = path
            .split("id:")
            .nth(1)
            .and_then(|v| v.split('/').next())
            .and_then(|v| v.parse::<MonitorId>().ok())
            .ok_or(Error::InvArgument("unknown path"))?;

        if path == Command::Status.path(id) {
            if let Some(gate) = self.with(|s| s.gates.remove(&id)) {
                gate.notified().await
            }
        }

        self.with(|s| {
            if path == Command::Status.path(id) {
                s.calls.queries += 1;
                if s.fail_status {
                    Err(Error::OperationError(String::from("refused")))
                } else if s.drop_status {
                    Ok(alarm::State::default())
                } else if s.active.contains(&id) {
                    Ok(alarm::State::new("3"))
                } else {
                    Ok(alarm::State::new("0"))
                }
            } else if path == Command::On.path(id) {
                s.calls.on += 1;
                s.active.insert(id);
                Ok(alarm::State::new("1"))
            } else if path == Command::Off.path(id) {
                s.calls.off += 1;
                if s.fail_off {
                    Err(Error::TimeoutError)
                } else {
                    s.active.remove(&id);
                    Ok(alarm::State::new("0"))
                }
            } else {
                Err(Error::InvArgument("unknown path"))
            }
        })
    }
}
