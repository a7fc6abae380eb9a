use super::host::HostDb;
use std::{convert::Infallible, sync::Arc};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{error, info, info_span, warn};
use tracing_futures::Instrument;
use zmalarm_api::{
    request::{Request, RequestChan},
    Error, MonitorId, Result,
};

/// Holds the state of the core task.
///
/// The core task owns the table of ZoneMinder hosts. Front ends send
/// it trigger requests through a channel; each request is run in its
/// own task so a slow server never holds up other requests.
struct State {
    hosts: Arc<HostDb>,
}

impl State {
    fn new(hosts: HostDb) -> Self {
        State {
            hosts: Arc::new(hosts),
        }
    }

    // Runs a trigger request. Nothing is returned to the requester;
    // the outcome and any error are logged.

    async fn trigger_alarm(hosts: Arc<HostDb>, host: Arc<str>, id: MonitorId) {
        info!("trigger_alarm");

        match hosts.trigger(&host, id).await {
            Ok(outcome) => info!("done -- {:?}", outcome),

            Err(e @ Error::UnknownHost(_)) => {
                error!(kind = e.kind(), "{}", &e)
            }

            Err(e) => error!(
                kind = e.kind(),
                remote = e.is_remote(),
                "couldn't trigger alarm -- {}",
                &e
            ),
        }
    }

    fn handle_request(&self, req: Request) {
        match req {
            Request::TriggerAlarm { host, monitor } => {
                let span = info_span!(
                    "trigger",
                    host = &*host,
                    monitor = %monitor
                );

                tokio::spawn(
                    State::trigger_alarm(self.hosts.clone(), host, monitor)
                        .instrument(span),
                );
            }
        }
    }

    /// Captures the State and runs as a async task using it as its
    /// mutable state. Normally it is run as a background task using
    /// `task::spawn`.
    async fn run(
        self,
        mut rx_req: mpsc::Receiver<Request>,
    ) -> Result<Infallible> {
        info!("starting");

        while let Some(req) = rx_req.recv().await {
            self.handle_request(req)
        }

        const ERR_MSG: &str = "no clients left";

        warn!(ERR_MSG);
        Err(Error::MissingPeer(ERR_MSG.to_string()))
    }
}

/// Starts the core task. Returns a `RequestChan` so front ends can
/// send requests to it.

pub fn start(hosts: HostDb) -> (RequestChan, JoinHandle<Result<Infallible>>) {
    // Create a channel that front ends can use to make requests. This
    // task will hang onto the Receiver end and each front end will
    // get a .clone() of the transmit handle.

    let (tx_req, rx_req) = mpsc::channel(10);

    (
        RequestChan::new(tx_req),
        tokio::spawn(
            State::new(hosts).run(rx_req).instrument(info_span!("zmalarm")),
        ),
    )
}
