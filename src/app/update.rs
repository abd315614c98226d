use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app::keymap::{KeyAction, KeyScope};
use crate::app::session::{FormInput, SaveJob, SessionEvent, open_session};
use crate::app::{AppState, InputMode};
use crate::modal::{Mode, SaveError};
use crate::search::apply_search;
use crate::ui;

pub fn run_app(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, app: &mut AppState) -> Result<()> {
    loop {
        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        pump_saves(app);

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(app, key) {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Apply every finished background save. Returns whether anything arrived.
pub fn pump_saves(app: &mut AppState) -> bool {
    let mut any = false;
    while let Ok(result) = app.save_rx.try_recv() {
        any = true;
        let Some(session) = app.session.as_mut() else {
            warn!("save finished with no modal open");
            continue;
        };
        let kind = session.kind();
        let failed = result.is_err();
        match session.complete(result) {
            SessionEvent::Saved => {
                app.status = Some(format!("{} saved", capitalize(kind.as_str())));
                close_session(app);
                app.reload_rows();
            }
            _ if failed => app.status = Some("Save failed".to_string()),
            _ => {}
        }
    }
    any
}

/// Dispatch one key press. Returns true when the app should quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal => return handle_dashboard_key(app, key),
        InputMode::Search => handle_search_key(app, key),
        InputMode::Help => app.input_mode = InputMode::Normal,
        InputMode::Modal => handle_form_key(app, key),
    }
    false
}

fn handle_dashboard_key(app: &mut AppState, key: KeyEvent) -> bool {
    let Some(action) = app.keymap.resolve(KeyScope::Dashboard, &key) else {
        return false;
    };
    let rpp = app.rows_per_page.max(1);
    match action {
        KeyAction::Quit => return true,
        KeyAction::OpenHelp => app.input_mode = InputMode::Help,
        KeyAction::StartSearch => {
            app.search_query.clear();
            app.input_mode = InputMode::Search;
            apply_search(app);
        }
        KeyAction::NewRecord => open_modal(app, Mode::Create),
        KeyAction::EditRecord => open_modal(app, Mode::Edit),
        KeyAction::ViewRecord => open_modal(app, Mode::View),
        KeyAction::NextKind => app.switch_kind(app.active_kind.next()),
        KeyAction::PrevKind => app.switch_kind(app.active_kind.prev()),
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < app.rows.len() {
                app.selected_index += 1;
            }
        }
        KeyAction::PageUp => app.selected_index = app.selected_index.saturating_sub(rpp),
        KeyAction::PageDown => {
            let new_idx = app.selected_index.saturating_add(rpp);
            app.selected_index = new_idx.min(app.rows.len().saturating_sub(1));
        }
        _ => {}
    }
    false
}

fn handle_search_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.input_mode = InputMode::Normal;
            apply_search(app);
        }
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Backspace => {
            app.search_query.pop();
            apply_search(app);
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.search_query.push(c);
            apply_search(app);
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    let input = match app.keymap.resolve(KeyScope::Form, &key) {
        Some(KeyAction::Submit) => FormInput::Submit,
        Some(KeyAction::CloseModal) => FormInput::Cancel,
        Some(KeyAction::NextField) => FormInput::NextField,
        Some(KeyAction::PrevField) => FormInput::PrevField,
        Some(KeyAction::DeleteChar) => FormInput::Backspace,
        Some(KeyAction::DismissServerError) => FormInput::DismissServerError,
        Some(KeyAction::DismissValidation) => FormInput::DismissValidation,
        _ => match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => FormInput::Char(c),
            _ => return,
        },
    };
    let Some(session) = app.session.as_mut() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match session.handle(input) {
        SessionEvent::None => {}
        SessionEvent::Closed => close_session(app),
        SessionEvent::Saved => {
            close_session(app);
            app.reload_rows();
        }
        SessionEvent::Save(job) => spawn_save(app, job),
    }
}

/// Open the form modal for the active kind. Edit and view use the selected row.
pub fn open_modal(app: &mut AppState, mode: Mode) {
    if app.session.as_ref().is_some_and(|s| s.is_submitting()) {
        debug!("open ignored while a save is in flight");
        return;
    }
    let record = match mode {
        Mode::Create => None,
        Mode::Edit | Mode::View => match app.selected_record() {
            Some(r) => Some(r.clone()),
            None => {
                app.status = Some(format!("No {} selected", app.active_kind));
                return;
            }
        },
    };
    match open_session(app.active_kind, mode, record.as_ref()) {
        Ok(session) => {
            app.session_record_id = record
                .as_ref()
                .and_then(crate::api::record_id)
                .map(str::to_string);
            app.session = Some(session);
            app.input_mode = InputMode::Modal;
            app.status = None;
        }
        Err(e) => {
            warn!(kind = %app.active_kind, ?mode, error = %e, "could not open modal");
            app.status = Some(format!("Cannot open {}: {e}", app.active_kind));
        }
    }
}

fn close_session(app: &mut AppState) {
    app.session = None;
    app.session_record_id = None;
    app.input_mode = InputMode::Normal;
}

/// Run the save on a worker thread; the result comes back through `save_rx`.
fn spawn_save(app: &AppState, job: SaveJob) {
    let api = Arc::clone(&app.api);
    let tx = app.save_tx.clone();
    let latency = app.save_latency;
    info!(kind = %job.kind, id = job.id.as_deref().unwrap_or("-"), "save dispatched");
    thread::spawn(move || {
        if !latency.is_zero() {
            thread::sleep(latency);
        }
        let result = match api.lock() {
            Ok(mut api) => api.save(job.kind, &job.payload, job.id.as_deref()),
            Err(_) => Err(SaveError::Message("Data store is unavailable".to_string())),
        };
        if tx.send(result).is_err() {
            debug!("save result dropped; app exited");
        }
    });
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryApi;
    use crate::app::Theme;
    use crate::app::keymap::Keymap;
    use crate::entity::EntityKind;
    use std::time::Instant;

    fn mk_app() -> AppState {
        AppState::new(InMemoryApi::with_sample_data(), Theme::dark(), Keymap::default())
    }

    fn press(app: &mut AppState, code: KeyCode) -> bool {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn wait_for_save(app: &mut AppState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !pump_saves(app) {
            assert!(Instant::now() < deadline, "save never finished");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn q_quits_only_from_the_dashboard() {
        let mut app = mk_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.input_mode, InputMode::Modal);
        assert!(!press(&mut app, KeyCode::Char('q')));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn tab_switches_kind_and_reloads() {
        let mut app = mk_app();
        assert_eq!(app.active_kind, EntityKind::User);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.active_kind, EntityKind::Room);
        assert_eq!(app.rows.len(), 2);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.active_kind, EntityKind::User);
    }

    #[test]
    fn create_room_through_the_form() {
        let mut app = mk_app();
        app.switch_kind(EntityKind::Room);
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Gym");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "40");
        press(&mut app, KeyCode::Enter);
        assert!(app.session.as_ref().is_some_and(|s| s.is_submitting()));

        // Esc is refused while the save is in flight.
        press(&mut app, KeyCode::Esc);
        assert!(app.session.is_some());

        wait_for_save(&mut app);
        assert!(app.session.is_none());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.rows.len(), 3);
        assert_eq!(app.status.as_deref(), Some("Room saved"));
    }

    #[test]
    fn rejected_save_keeps_the_modal_with_a_banner() {
        let mut app = mk_app();
        app.switch_kind(EntityKind::Room);
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "101");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "10");
        press(&mut app, KeyCode::Enter);
        wait_for_save(&mut app);

        let view = app.session.as_ref().unwrap().view(Instant::now());
        assert_eq!(view.server_error.as_deref(), Some("Room name already exists"));
        assert!(!view.submitting);

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL));
        let view = app.session.as_ref().unwrap().view(Instant::now());
        assert_eq!(view.server_error, None);
    }

    #[test]
    fn edit_without_selection_sets_status() {
        let mut app = AppState::new(InMemoryApi::new(), Theme::dark(), Keymap::default());
        press(&mut app, KeyCode::Char('e'));
        assert!(app.session.is_none());
        assert_eq!(app.status.as_deref(), Some("No user selected"));
    }

    #[test]
    fn search_mode_filters_and_escape_restores() {
        let mut app = mk_app();
        let total = app.rows.len();
        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "jones");
        assert_eq!(app.rows.len(), 1);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.rows.len(), total);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut app = mk_app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_index, 0);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.selected_index, app.rows.len() - 1);
    }
}
