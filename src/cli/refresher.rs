use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use chrono::Utc;
use log::{debug, warn};
use tokio::{
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::timer::SessionRunner;

use super::menu::{render_menu, CLEAR_SCREEN, MENU_PROMPT};

/// Tracks the last drawn status line so the screen only changes when the
/// line does.
#[derive(Debug, Default)]
pub struct RedrawGate {
    last: Option<String>,
}

impl RedrawGate {
    /// Returns true when `line` should be drawn now.
    pub fn observe(&mut self, line: &Option<String>, at_menu: bool) -> bool {
        if !at_menu || *line == self.last {
            return false;
        }
        self.last.clone_from(line);
        true
    }

    /// Records a redraw done by someone else.
    pub fn drawn(&mut self, line: Option<String>) {
        self.last = line;
    }
}

/// Screen state shared by the command loop and the refresher.
#[derive(Debug, Default)]
pub struct MenuScreen {
    at_menu: AtomicBool,
    gate: Mutex<RedrawGate>,
}

impl MenuScreen {
    fn gate(&self) -> MutexGuard<'_, RedrawGate> {
        match self.gate.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_at_menu(&self, at_menu: bool) {
        self.at_menu.store(at_menu, Ordering::SeqCst);
    }

    /// Records a menu drawn by the command loop.
    pub fn drawn(&self, line: Option<String>) {
        self.gate().drawn(line);
    }

    /// True when the menu is showing and `line` differs from the last draw.
    pub fn should_redraw(&self, line: &Option<String>) -> bool {
        let at_menu = self.at_menu.load(Ordering::SeqCst);
        self.gate().observe(line, at_menu)
    }
}

pub struct RefresherConfig {
    pub poll_interval: Duration,
    pub clear_screen: bool,
}

/// Polls the running status on a fixed cadence and redraws the main menu
/// when it changes. Also wakes up early on phase changes.
pub fn spawn_refresher(
    runner: SessionRunner,
    screen: Arc<MenuScreen>,
    config: RefresherConfig,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut changes = runner.channel().subscribe();

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
                Ok(()) = changes.changed() => {}
            }

            let line = runner.status_line(Utc::now());
            if screen.should_redraw(&line) {
                if let Err(err) = redraw(line.as_deref(), config.clear_screen) {
                    warn!("screen refresh failed: {err}");
                }
            }
        }

        debug!("refresher stopped");
    })
}

fn redraw(status_line: Option<&str>, clear_screen: bool) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    if clear_screen {
        write!(stdout, "{CLEAR_SCREEN}")?;
    }
    writeln!(stdout, "{}", render_menu(status_line))?;
    write!(stdout, "{MENU_PROMPT}")?;
    stdout.flush()
}
