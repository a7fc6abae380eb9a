use serde_derive::Deserialize;
use std::{
    convert::Infallible,
    net::{Ipv4Addr, SocketAddr},
};
use tracing::{error, info, info_span, warn, Instrument};
use warp::{http::StatusCode, Filter, Rejection, Reply};
use zmalarm_api::{request, Error, Result};

fn def_address() -> SocketAddr {
    (Ipv4Addr::new(0, 0, 0, 0), 3000).into()
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "def_address")]
    pub addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: def_address(),
        }
    }
}

// Hands a trigger request to core. The reply only says whether the
// request was queued; the alarm is handled in the background.

async fn trigger_alarm(
    req: request::TriggerAlarm,
    chan: request::RequestChan,
) -> std::result::Result<impl Reply, Infallible> {
    info!("trigger_alarm: {} - monitor {}", &req.name, req.id);

    let status = match chan.trigger_alarm(req.name, req.id).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            warn!("couldn't queue request -- {}", &e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    Ok(warp::reply::with_status(warp::reply(), status))
}

/// Builds the routes of the web server. The only one is
/// `POST /api/trigger_alarm`, which takes a JSON body of the form
/// `{"name": "<host>", "id": <monitor>}`, where the monitor id may
/// also be sent as a string. A body that's missing a field, or has a
/// monitor id that isn't a positive integer, is rejected with a 400.

pub fn routes(
    chan: request::RequestChan,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let chan = warp::any().map(move || chan.clone());

    warp::post()
        .and(warp::path!("api" / "trigger_alarm"))
        .and(warp::body::content_length_limit(4096))
        .and(warp::body::json())
        .and(chan)
        .and_then(trigger_alarm)
}

/// Runs the web server. This only returns if the server couldn't be
/// started.

pub async fn server(
    cfg: Config,
    chan: request::RequestChan,
) -> Result<Infallible> {
    let (addr, fut) = warp::serve(routes(chan))
        .try_bind_ephemeral(cfg.addr)
        .map_err(|e| {
            error!("can't start web server -- {}", &e);
            Error::OperationError(format!("can't bind {} -- {}", cfg.addr, e))
        })?;

    info!("listening on {}", addr);

    fut.instrument(info_span!("httpd")).await;

    Err(Error::OperationError(String::from("web server exited")))
}
