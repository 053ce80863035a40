use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::Backend;

use crate::App;
use crate::controller::ConnectionState;

/// Result of handling a key event
pub enum KeyFlow {
    Continue,
    Quit,
}

/// Top-level key handler: popup dismissal first, then browser bindings.
///
/// While an operation is in flight only cursor movement, disconnect and quit
/// are honoured.
pub fn handle_key_event<B: Backend>(app: &mut App<B>, key: KeyEvent) -> KeyFlow {
    // Only handle actual key presses (ignore repeats/releases)
    if key.kind != KeyEventKind::Press {
        return KeyFlow::Continue;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyFlow::Quit;
    }

    if app.error.is_some() || app.info.is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            app.error = None;
            app.info = None;
        }
        return KeyFlow::Continue;
    }

    match key.code {
        KeyCode::Char('q') => return KeyFlow::Quit,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Char('c') => toggle_connection(app),
        _ if app.is_busy() => {
            tracing::debug!("Ignoring {:?} while busy", key.code);
        }
        KeyCode::Enter => app.select_current(),
        KeyCode::Backspace | KeyCode::Char('b') => app.back(),
        KeyCode::Char('u') => app.up(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('a') => app.analyze_root(),
        _ => {}
    }
    KeyFlow::Continue
}

fn toggle_connection<B: Backend>(app: &mut App<B>) {
    match app.state {
        ConnectionState::Disconnected if !app.is_busy() => app.connect(),
        ConnectionState::Disconnected => {}
        ConnectionState::Connecting | ConnectionState::Connected => app.disconnect(),
        ConnectionState::Disconnecting => {}
    }
}
