//! Interactive terminal front end.
//!
//! The command loop reads input asynchronously, so neither the background
//! session nor the refresher ever waits on the user.

pub mod input;
pub mod menu;
pub mod refresher;

use std::{io::Write, sync::Arc};

use anyhow::Result;
use chrono::Utc;
use log::info;
use tokio::io::AsyncBufRead;

use crate::{error::SessionError, store::SessionStore, timer::SessionRunner};

use input::Prompter;
use refresher::MenuScreen;
use menu::{header, render_menu, section, session_lines, CLEAR_SCREEN, MENU_PROMPT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

pub struct App<R, W> {
    store: SessionStore,
    runner: SessionRunner,
    prompter: Prompter<R, W>,
    screen: Arc<MenuScreen>,
    clear_screen: bool,
}

impl<R, W> App<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        store: SessionStore,
        runner: SessionRunner,
        prompter: Prompter<R, W>,
        clear_screen: bool,
    ) -> Self {
        Self {
            store,
            runner,
            prompter,
            screen: Arc::new(MenuScreen::default()),
            clear_screen,
        }
    }

    /// Screen state to hand to the refresher.
    pub fn menu_screen(&self) -> Arc<MenuScreen> {
        Arc::clone(&self.screen)
    }

    /// Runs the menu until the user exits or input closes, then rolls back
    /// any session still running.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.show_menu()?;
            self.screen.set_at_menu(true);
            let choice = self.prompter.line(MENU_PROMPT).await;
            self.screen.set_at_menu(false);

            let flow = match choice?.as_deref().map(str::trim) {
                None | Some("0") => Flow::Exit,
                Some("1") => self.create_session().await?,
                Some("2") => self.run_session().await?,
                Some("3") => self.list_sessions().await?,
                Some("4") => self.delete_session().await?,
                Some("5") => self.cancel_session().await?,
                Some(other) => {
                    self.prompter
                        .say(&format!("\nUnknown option '{other}'. Choose 0-5."))?;
                    self.pause().await?
                }
            };

            if flow == Flow::Exit {
                break;
            }
        }

        self.runner.shutdown().await;
        self.prompter.say(&format!("\n{}", header("Goodbye.")))?;
        info!("menu closed");
        Ok(())
    }

    fn show_menu(&mut self) -> Result<()> {
        if self.clear_screen {
            self.prompter.print(CLEAR_SCREEN)?;
        }
        let status = self.runner.status_line(Utc::now());
        self.prompter.say(&render_menu(status.as_deref()))?;
        self.screen.drawn(status);
        Ok(())
    }

    async fn pause(&mut self) -> Result<Flow> {
        Ok(match self.prompter.line("\nPress Enter to continue...").await? {
            Some(_) => Flow::Continue,
            None => Flow::Exit,
        })
    }

    async fn create_session(&mut self) -> Result<Flow> {
        self.prompter.say(&section("Create session"))?;

        let Some(title) = self.prompter.text("Title: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(focus) = self.prompter.number("Focus minutes: ", 1).await? else {
            return Ok(Flow::Exit);
        };
        let Some(rest) = self.prompter.number("Break minutes: ", 1).await? else {
            return Ok(Flow::Exit);
        };
        let Some(rounds) = self.prompter.number("Rounds: ", 1).await? else {
            return Ok(Flow::Exit);
        };

        match self.store.create(&title, focus, rest, rounds) {
            Ok(session) => self
                .prompter
                .say(&format!("\nSession created.\n  {session}"))?,
            Err(err) => self.prompter.say(&format!("\nError: {err}"))?,
        }
        self.pause().await
    }

    async fn run_session(&mut self) -> Result<Flow> {
        self.prompter.say(&section("Run session"))?;

        if let Some(id) = self.runner.active_session_id().await {
            self.prompter
                .say(&format!("Session {id} is already running."))?;
            return self.pause().await;
        }

        let pending = self.store.pending();
        if pending.is_empty() {
            self.prompter
                .say("No pending sessions. Create one first.")?;
            return self.pause().await;
        }

        self.prompter.say("Pending sessions:")?;
        for session in &pending {
            self.prompter.say(&format!("  {session}"))?;
        }

        let Some(id) = self.prompter.number::<u64>("\nSession id to run: ", 1).await? else {
            return Ok(Flow::Exit);
        };

        let message = match self.runner.start(id).await {
            Ok(()) => format!("\nSession {id} started in the background."),
            Err(SessionError::NotFound(_)) => format!("\nNo session with id {id}."),
            Err(err) => format!("\nCannot start: {err}."),
        };
        self.prompter.say(&message)?;
        self.pause().await
    }

    async fn list_sessions(&mut self) -> Result<Flow> {
        self.prompter.say(&section("Sessions"))?;

        let sessions = self.store.list();
        for line in session_lines(&sessions) {
            self.prompter.say(&line)?;
        }
        if !sessions.is_empty() {
            self.prompter.say(&format!(
                "\nBy status: pending {} | completed {}",
                self.store.pending().len(),
                self.store.completed().len()
            ))?;
        }
        self.pause().await
    }

    async fn delete_session(&mut self) -> Result<Flow> {
        self.prompter.say(&section("Delete session"))?;

        if self.store.is_empty() {
            self.prompter.say("No sessions to delete.")?;
            return self.pause().await;
        }

        for session in self.store.list() {
            self.prompter.say(&format!("  {session}"))?;
        }

        let Some(id) = self.prompter.number::<u64>("\nSession id to delete: ", 1).await? else {
            return Ok(Flow::Exit);
        };
        let Some(session) = self.store.get(id) else {
            self.prompter.say(&format!("\nNo session with id {id}."))?;
            return self.pause().await;
        };

        let prompt = format!("Delete '{}'? (y/n): ", session.title);
        let Some(confirmed) = self.prompter.confirm(&prompt).await? else {
            return Ok(Flow::Exit);
        };

        let message = if !confirmed {
            "Deletion cancelled.".to_string()
        } else {
            match self.store.delete(id) {
                Ok(true) => format!("\n'{}' deleted.", session.title),
                Ok(false) => format!("\nNo session with id {id}."),
                Err(err) => format!("\nCannot delete: {err}."),
            }
        };
        self.prompter.say(&message)?;
        self.pause().await
    }

    async fn cancel_session(&mut self) -> Result<Flow> {
        self.prompter.say(&section("Cancel running session"))?;

        match self.runner.active_session_id().await {
            Some(id) => {
                self.runner.cancel().await;
                self.prompter
                    .say(&format!("Session {id} cancelled and reset to pending."))?;
            }
            None => self.prompter.say("Nothing is running.")?,
        }
        self.pause().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::SessionStatus, timer::RunningInfoChannel};

    fn build_app(input: &'static str) -> (App<&'static [u8], Vec<u8>>, SessionStore) {
        let store = SessionStore::new();
        let runner = SessionRunner::new(store.clone(), RunningInfoChannel::new());
        let prompter = Prompter::new(input.as_bytes(), Vec::new());
        (App::new(store.clone(), runner, prompter, false), store)
    }

    fn output(app: &App<&'static [u8], Vec<u8>>) -> String {
        String::from_utf8(app.prompter.output().clone()).unwrap()
    }

    #[tokio::test]
    async fn create_reprompts_invalid_numbers() {
        let (mut app, store) = build_app("1\nDeep work\n0\n25\n5\n4\n\n0\n");
        app.run().await.unwrap();

        let sessions = store.list();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].focus_minutes, 25);
        assert_eq!(sessions[0].rounds, 4);
        assert!(output(&app).contains("at least 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_starts_session_and_exit_rolls_back() {
        let (mut app, store) = build_app("1\nDeep work\n1\n1\n1\n\n2\n1\n\n0\n");
        app.run().await.unwrap();

        assert!(output(&app).contains("Session 1 started in the background."));
        assert_eq!(store.get(1).unwrap().status, SessionStatus::Pending);
        assert!(app.runner.channel().snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_refuses_running_session() {
        let (mut app, store) = build_app("2\n1\n\n4\n1\ny\n\n5\n\n4\n1\ny\n\n0\n");
        store.create("Deep work", 1, 1, 1).unwrap();
        app.run().await.unwrap();

        let out = output(&app);
        assert!(out.contains("Cannot delete: session 1 is running."));
        assert!(out.contains("Session 1 cancelled and reset to pending."));
        assert!(out.contains("'Deep work' deleted."));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn run_reports_missing_and_non_pending_sessions() {
        let (mut app, store) = build_app("2\n9\n\n0\n");
        store.create("Deep work", 1, 1, 1).unwrap();
        app.run().await.unwrap();
        assert!(output(&app).contains("No session with id 9."));

        let (mut app, store) = build_app("2\n\n0\n");
        let session = store.create("Deep work", 1, 1, 1).unwrap();
        store
            .set_status(session.id, SessionStatus::Completed)
            .unwrap();
        app.run().await.unwrap();
        assert!(output(&app).contains("No pending sessions."));
    }

    #[tokio::test]
    async fn list_shows_totals_and_status_counts() {
        let (mut app, store) = build_app("3\n\n");
        store.create("a", 1, 1, 1).unwrap();
        let done = store.create("b", 1, 1, 1).unwrap();
        store.set_status(done.id, SessionStatus::Completed).unwrap();
        app.run().await.unwrap();

        let out = output(&app);
        assert!(out.contains("Total: 2 session(s)"));
        assert!(out.contains("By status: pending 1 | completed 1"));
        assert!(out.contains("Goodbye."));
    }

    #[tokio::test]
    async fn menu_draw_is_shared_with_refresher() {
        let (mut app, _store) = build_app("");
        let screen = app.menu_screen();
        screen.drawn(Some("[Running] Session 1 - Focus | 00:59 / 01:00".into()));

        app.show_menu().unwrap();
        screen.set_at_menu(true);

        assert!(!screen.should_redraw(&None));
    }

    #[tokio::test]
    async fn session_ids_beyond_u32_are_accepted() {
        let (mut app, _store) = build_app("2\n4294967296\n\n4\n4294967296\n\n");
        app.store.create("Deep work", 1, 1, 1).unwrap();
        app.run().await.unwrap();

        let out = output(&app);
        assert_eq!(out.matches("No session with id 4294967296.").count(), 2);
    }

    #[tokio::test]
    async fn unknown_option_and_idle_cancel() {
        let (mut app, _store) = build_app("7\n\n5\n\n");
        app.run().await.unwrap();

        let out = output(&app);
        assert!(out.contains("Unknown option '7'"));
        assert!(out.contains("Nothing is running."));
    }
}
