use super::{host::Host, ttl};
use std::sync::Arc;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, error, info, info_span, warn};
use tracing_futures::Instrument;
use zmalarm_api::{alarm::Command, Error, MonitorId, Result};

// The countdown of an armed alarm ticks once per second.

const TICK: Duration = Duration::from_secs(1);

/// Reports what a trigger request did to a monitor.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The alarm was off. It has been turned on and a countdown of
    /// `ttl` seconds started.
    Armed { ttl: u32 },

    /// The alarm was already on and counting down. `remaining` is
    /// the countdown after adding the time-to-live.
    Extended { remaining: u32 },

    /// The countdown was running but the server reported the alarm
    /// off (someone turned it off behind our back.) The alarm has
    /// been turned on again and the countdown restarted at `ttl`.
    Rearmed { ttl: u32 },

    /// The alarm is on, but not because of us. It's left alone.
    Unmanaged,
}

impl Host {
    // Sends one of the alarm commands for monitor `id`.

    async fn send(&self, cmd: Command, id: MonitorId) -> Result<()> {
        let state = self.client.get_state(&cmd.path(id)).await?;

        info!("alarm {}: '{}'", cmd, state.status.as_deref().unwrap_or(""));
        Ok(())
    }

    /// Triggers the alarm of monitor `id`.
    ///
    /// If the alarm is off, it's turned on and a countdown task is
    /// started which turns it off again after `ttl` seconds. If the
    /// alarm is already on because of an earlier trigger, the
    /// countdown is extended by `ttl` seconds. Either way, this
    /// returns without waiting for the countdown.
    ///
    /// The monitor's countdown entry stays locked for the whole
    /// sequence, so concurrent triggers of the same monitor are
    /// handled one at a time: the first one arms the alarm and the
    /// others extend it. An error leaves the countdown as it was at
    /// the point of failure.
    ///
    /// The countdown task can't tick while the entry is locked. If
    /// the server is slow to answer, the alarm stays on past its
    /// time-to-live. The countdown catches up on the missed seconds
    /// once the trigger finishes, so the alarm is turned off as soon
    /// as its (possibly extended) time has run out.
    pub async fn trigger(self: &Arc<Self>, id: MonitorId) -> Result<Outcome> {
        let entry = self.countdowns.get_or_init(id).await;
        let mut countdown = entry.lock().await;
        let result = self.update(id, &entry, &mut countdown).await;

        if !countdown.is_active() {
            self.countdowns.prune(id, &entry).await
        }
        result
    }

    async fn update(
        self: &Arc<Self>,
        id: MonitorId,
        entry: &ttl::Entry,
        countdown: &mut ttl::Countdown,
    ) -> Result<Outcome> {
        self.client.login().await?;

        let state = self.client.get_state(&Command::Status.path(id)).await?;

        debug!(
            "alarm status: {:?}, TTL: {:?}",
            &state.status,
            countdown.remaining()
        );

        if state.status.is_none() {
            return Err(Error::ProtocolError(String::from(
                "alarm status reply has no 'status' field",
            )));
        }

        if state.is_inactive() {
            let running = countdown.is_active();

            self.send(Command::On, id).await?;
            countdown.set(self.ttl);

            // Only the transition from idle starts a countdown task.
            // If one is already running, it picks up the new value.

            if running {
                warn!("alarm was turned off while counting down");
                Ok(Outcome::Rearmed { ttl: self.ttl })
            } else {
                self.start_countdown(id, entry.clone());
                Ok(Outcome::Armed { ttl: self.ttl })
            }
        } else if let Some(remaining) = countdown.extend(self.ttl) {
            info!("alarm already enabled, TTL now {} sec", remaining);
            Ok(Outcome::Extended { remaining })
        } else {
            warn!("alarm is on but isn't being counted down -- leaving it");
            Ok(Outcome::Unmanaged)
        }
    }

    fn start_countdown(self: &Arc<Self>, id: MonitorId, entry: ttl::Entry) {
        let host = self.clone();
        let span = info_span!("countdown", host = &*self.name, monitor = %id);

        tokio::spawn(host.run_countdown(id, entry).instrument(span));
    }

    // Decrements the countdown every second. When it reaches zero,
    // the alarm is turned off and the entry goes back to idle. The
    // entry is locked while turning the alarm off, so a trigger that
    // arrives in the meantime sees the final state of the server.

    async fn run_countdown(self: Arc<Self>, id: MonitorId, entry: ttl::Entry) {
        let mut interval = time::interval_at(Instant::now() + TICK, TICK);

        loop {
            interval.tick().await;

            let mut countdown = entry.lock().await;

            match countdown.decrement() {
                Some(0) | None => {
                    if let Err(e) = self.send(Command::Off, id).await {
                        error!(
                            kind = e.kind(),
                            "couldn't turn off alarm -- {}", &e
                        )
                    }
                    countdown.clear();
                    self.countdowns.prune(id, &entry).await;
                    break;
                }
                Some(remaining) => debug!("alarm TTL (sec): {}", remaining),
            }
        }
    }
}
