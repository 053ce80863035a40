use std::collections::VecDeque;

use crossterm::event::Event;
use ratatui::Terminal;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::Backend;
use tokio::sync::mpsc;

use crate::controller::{ConnectionState, StatusLevel};
use crate::error::{AppError, Result};
use crate::events::{AppEvent, SessionEvent};
use crate::key_event::{KeyFlow, handle_key_event};
use crate::listing::{DirectoryEntry, DirectoryListing};
use crate::path::RemotePath;
use crate::remote::Credentials;
use crate::ui::{
    draw_error_popup, draw_footer, draw_header, draw_info_popup, draw_listing, draw_log,
};
use crate::worker::ControllerHandle;

/// Lines kept in the scrollback log pane.
const LOG_CAPACITY: usize = 500;

/// Browser state plus the terminal it renders into.
pub struct App<B: Backend> {
    pub state: ConnectionState,
    pub listing: Option<DirectoryListing>,
    pub selected: usize,
    pub log: VecDeque<String>,
    pub error: Option<String>,
    pub info: Option<String>,
    credentials: Credentials,
    handle: ControllerHandle,
    pending: usize, // Commands sent but not yet finished
    ticks: u64,
    worker_stopped: bool,
    terminal: Terminal<B>,
    needs_redraw: bool,
}

impl<B: Backend> App<B> {
    pub fn new(terminal: Terminal<B>, handle: ControllerHandle, credentials: Credentials) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            listing: None,
            selected: 0,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            error: None,
            info: None,
            credentials,
            handle,
            pending: 0,
            ticks: 0,
            worker_stopped: false,
            terminal,
            needs_redraw: true,
        }
    }

    pub fn init_terminal(&mut self) -> Result<()> {
        use crossterm::ExecutableCommand;
        use crossterm::terminal::{EnterAlternateScreen, enable_raw_mode};

        enable_raw_mode().inspect_err(|e| tracing::error!("Error enabling raw mode: {}", e))?;
        std::io::stdout()
            .execute(EnterAlternateScreen)
            .inspect_err(|e| {
                tracing::error!(
                    "Error executing EnterAlternateScreen terminal command: {}",
                    e
                )
            })?;
        self.terminal.clear()?;
        Ok(())
    }

    /// True while the worker still has commands of ours queued or running.
    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn selected_entry(&self) -> Option<&DirectoryEntry> {
        self.listing.as_ref().and_then(|l| l.get(self.selected))
    }

    pub fn current_path(&self) -> Option<&RemotePath> {
        self.listing.as_ref().map(DirectoryListing::path)
    }

    pub fn select_next(&mut self) {
        let len = self.listing.as_ref().map_or(0, DirectoryListing::len);
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    pub fn select_prev(&mut self) {
        let len = self.listing.as_ref().map_or(0, DirectoryListing::len);
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn connect(&mut self) {
        let credentials = self.credentials.clone();
        self.dispatch(|h| h.connect(credentials));
    }

    /// Allowed while busy. A running download is cancelled; any other
    /// command finishes first.
    pub fn disconnect(&mut self) {
        self.dispatch(ControllerHandle::disconnect);
    }

    pub fn select_current(&mut self) {
        if let Some(entry) = self.selected_entry().cloned() {
            self.dispatch(|h| h.select(entry));
        }
    }

    pub fn back(&mut self) {
        self.dispatch(ControllerHandle::back);
    }

    pub fn up(&mut self) {
        self.dispatch(ControllerHandle::up);
    }

    pub fn reload(&mut self) {
        self.dispatch(ControllerHandle::reload);
    }

    pub fn analyze_root(&mut self) {
        self.dispatch(|h| h.analyze_names(RemotePath::root()));
    }

    fn dispatch(&mut self, send: impl FnOnce(&ControllerHandle) -> Result<()>) {
        match send(&self.handle) {
            Ok(()) => self.pending += 1,
            Err(e) => self.set_error(e),
        }
    }

    pub fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Listing(listing) => {
                self.listing = listing;
                self.selected = 0;
            }
            SessionEvent::Status { level, message, at } => {
                if self.log.len() == LOG_CAPACITY {
                    self.log.pop_front();
                }
                self.log
                    .push_back(format!("{} - {}", at.format("%H:%M:%S"), message));
                if level == StatusLevel::Error {
                    self.error = Some(message);
                }
            }
            SessionEvent::State(state) => {
                self.state = state;
            }
            SessionEvent::Report(text) => self.set_info(text),
            SessionEvent::Idle => {
                self.pending = self.pending.saturating_sub(1);
            }
            SessionEvent::Stopped => {
                self.worker_stopped = true;
                self.pending = 0;
            }
        }
        self.mark_redraw();
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);
        if self.is_busy() {
            self.mark_redraw();
        }
    }

    /// Mark that UI needs redrawing
    pub fn mark_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Check if redraw is needed and mark as drawn
    pub fn should_redraw(&mut self) -> bool {
        let should = self.needs_redraw;
        self.needs_redraw = false;
        should
    }

    pub fn set_error(&mut self, error: AppError) {
        self.error = Some(error.to_string());
        self.needs_redraw = true;
    }

    pub fn set_info(&mut self, info: String) {
        self.info = Some(info);
        self.needs_redraw = true;
    }

    pub fn draw(&mut self) -> Result<()> {
        let busy = self.is_busy();
        let ticks = self.ticks;
        let state = self.state;
        let endpoint = self.credentials.host_port();
        let listing = self.listing.as_ref();
        let selected = self.selected;
        let log = &self.log;
        let error = self.error.as_deref();
        let info = self.info.as_deref();

        self.terminal.draw(|f| {
            let area = f.area();
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),      // Header
                    Constraint::Min(5),         // Listing
                    Constraint::Percentage(30), // Log
                    Constraint::Length(3),      // Footer
                ])
                .split(area);

            draw_header(f, layout[0], state, &endpoint, listing, busy.then_some(ticks));
            draw_listing(f, layout[1], listing, selected);
            draw_log(f, layout[2], log);
            draw_footer(f, layout[3], state);

            if let Some(message) = error {
                draw_error_popup(area, message, f);
            } else if let Some(message) = info {
                draw_info_popup(area, message, f);
            }
        })?;
        Ok(())
    }

    pub async fn run(&mut self, rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Result<()> {
        loop {
            if self.should_redraw() {
                self.draw()?;
            }

            let ev = match rx.recv().await {
                Some(e) => e,
                None => {
                    tracing::warn!("App event channel closed");
                    break;
                }
            };

            match ev {
                AppEvent::Tick => self.on_tick(),
                AppEvent::Input(Event::Key(key)) => match handle_key_event(self, key) {
                    KeyFlow::Quit => break,
                    KeyFlow::Continue => self.mark_redraw(),
                },
                AppEvent::Input(Event::Resize(_, _)) => self.mark_redraw(),
                AppEvent::Input(_) => {}
                AppEvent::Session(event) => {
                    self.on_session_event(event);
                    if self.worker_stopped {
                        tracing::warn!("Controller worker stopped; leaving");
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
