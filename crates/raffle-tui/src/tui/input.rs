// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (form editing,
// confirmation dialogs).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use raffle_core::protocol::UserCommand;

use super::ViewState;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when the key press was handled locally
/// by mutating `ViewState`.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }
    if view_state.confirm_reset {
        return handle_confirm_reset(key_event, view_state);
    }

    if view_state.is_configured() {
        handle_draw_screen(key_event, view_state)
    } else {
        handle_setup_form(key_event, view_state)
    }
}

/// Keys on the draw screen.
fn handle_draw_screen(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(UserCommand::Draw),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(UserCommand::Redraw),
        KeyCode::Char('x') | KeyCode::Char('X') => {
            view_state.confirm_reset = true;
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// Keys while the setup form is showing.
///
/// - Tab / Down move to the next field, Shift+Tab / Up to the previous one
/// - Enter submits the form
/// - Backspace deletes, Esc dismisses the error message
/// - Characters the focused field accepts are typed into it
fn handle_setup_form(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Tab | KeyCode::Down => {
            view_state.form.focus_next();
            None
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_state.form.focus_prev();
            None
        }
        KeyCode::Enter => Some(view_state.form.to_command()),
        KeyCode::Backspace => {
            view_state.form.backspace();
            None
        }
        KeyCode::Esc => {
            view_state.form_error = None;
            None
        }
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        KeyCode::Char(c) => {
            view_state.form.insert(c);
            None
        }
        _ => None,
    }
}

/// In quit confirmation mode:
/// - `y` or `q` confirms quit (sends UserCommand::Quit)
/// - `n` or `Esc` cancels
/// - All other keys are blocked
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => {
            Some(UserCommand::Quit)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// Reset discards every winner, so only an explicit `y` goes through.
fn handle_confirm_reset(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            view_state.confirm_reset = false;
            Some(UserCommand::Reset)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_reset = false;
            None
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
