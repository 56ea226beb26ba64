pub mod cli;
pub mod error;
pub mod models;
pub mod settings;
pub mod store;
pub mod timer;
mod utils;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use cli::{
    input::Prompter,
    refresher::{spawn_refresher, RefresherConfig},
    App,
};
use settings::Settings;
use store::SessionStore;
use timer::{RunningInfoChannel, SessionRunner};

pub use error::SessionError;

/// Blocking stdin reads may still be parked when the menu exits.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

pub fn run() -> Result<()> {
    let (settings, settings_error) = match Settings::from_env() {
        Ok(settings) => (settings, None),
        Err(err) => (Settings::fallback(), Some(err)),
    };

    utils::logging::init(&settings)?;
    if let Some(err) = settings_error {
        warn!("{err:#}; using default settings");
    }

    info!("pomoloop starting up...");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let result = runtime.block_on(run_menu(settings));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
    result
}

async fn run_menu(settings: Settings) -> Result<()> {
    let store = SessionStore::new();
    let runner = SessionRunner::with_tick_interval(
        store.clone(),
        RunningInfoChannel::new(),
        settings.tick_interval(),
    );

    let prompter = Prompter::new(BufReader::new(tokio::io::stdin()), io::stdout());
    let mut app = App::new(store, runner.clone(), prompter, settings.clear_screen);

    let stop_refresher = CancellationToken::new();
    let refresher = spawn_refresher(
        runner.clone(),
        app.menu_screen(),
        RefresherConfig {
            poll_interval: settings.poll_interval(),
            clear_screen: settings.clear_screen,
        },
        stop_refresher.clone(),
    );

    let result = tokio::select! {
        result = app.run() => result,
        signal = tokio::signal::ctrl_c() => {
            info!("interrupted; rolling back any running session");
            runner.shutdown().await;
            signal.context("failed to listen for ctrl-c")
        }
    };

    stop_refresher.cancel();
    if let Err(err) = refresher.await {
        warn!("refresher task failed: {err}");
    }

    result
}
