use futures::future;
use std::convert::Infallible;
use tokio::task::JoinHandle;
use tracing::{error, trace, warn};
use zmalarm_api::{Error, Result};

mod config;
mod core;
mod host;
mod httpd;
mod trigger;
mod ttl;
mod zm;

#[cfg(test)]
mod mock;

// Initializes the `zmalarmd` application. It determines the
// configuration and sets up the logger. It returns `Some(Config)`
// with the found configuration, if the applications is to run. It
// returns `None` if the program should exit (because a command line
// option asked for a "usage" message, for instance.)

async fn init_app() -> Option<config::Config> {
    // If a configuration is returned, set up the logger.

    if let Some(cfg) = config::get().await {
        // Initialize the log system. The max log level is determined
        // by the user (either through the config file or the command
        // line.)

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(cfg.get_log_level())
            .with_target(false)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("ERROR: unable to set default subscriber -- {}", e);
            return None;
        }
        Some(cfg)
    } else {
        None
    }
}

async fn wrap_task(
    handle: JoinHandle<Result<Infallible>>,
) -> Result<Infallible> {
    match handle.await {
        Err(e) if e.is_panic() => {
            error!("terminated due to panic");
            Err(Error::OperationError("task panicked".to_owned()))
        }

        Err(_) => {
            error!("terminated due to cancellation");
            Err(Error::OperationError("task was canceled".to_owned()))
        }

        Ok(Ok(_)) => unreachable!(),

        Ok(Err(e)) => {
            error!("task returned error -- {}", &e);
            Err(e)
        }
    }
}

// Runs the main body of the application. This top-level task reads
// the config, builds the table of ZoneMinder hosts, starts the core
// task and the web server, and monitors their health.

async fn run() -> Result<()> {
    if let Some(cfg) = init_app().await {
        let hosts = host::HostDb::create(&cfg.host)?;

        // Start the core task. It returns a handle to a channel with
        // which to make requests. It also returns the task handle.

        let (tx_req, core_task) = core::start(hosts);

        trace!("starting web server");

        let httpd_task = tokio::spawn(httpd::server(cfg.httpd, tx_req));

        // Neither task should ever exit. If one does, shut down.

        let (result, _, _) = future::select_all(vec![
            Box::pin(wrap_task(core_task)),
            Box::pin(wrap_task(httpd_task)),
        ])
        .await;

        warn!("shutting down");

        result.map(|_| ())
    } else {
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("ERROR: {:?}", e)
    }
}
