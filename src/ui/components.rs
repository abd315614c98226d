//! Shared UI components: status bar, help overlay and layout helpers.
//!
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode};

/// Render the bottom status bar with mode, counts and the last status message.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => match &app.session {
            Some(s) if s.is_submitting() => "SAVING",
            _ => "FORM",
        },
        InputMode::Help => "HELP",
    };
    let mut msg = format!(
        "mode: {mode}  {}: {}/{}  rows/page:{}",
        app.active_kind.plural().to_lowercase(),
        app.rows.len(),
        app.rows_all.len(),
        app.rows_per_page
    );
    if let Some(status) = &app.status {
        msg.push_str("  | ");
        msg.push_str(status);
    }
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

const DASHBOARD_HELP: [(&str, KeyAction); 10] = [
    ("New record", KeyAction::NewRecord),
    ("Edit selected", KeyAction::EditRecord),
    ("View selected", KeyAction::ViewRecord),
    ("Next kind", KeyAction::NextKind),
    ("Previous kind", KeyAction::PrevKind),
    ("Move up", KeyAction::MoveUp),
    ("Move down", KeyAction::MoveDown),
    ("Search", KeyAction::StartSearch),
    ("Help", KeyAction::OpenHelp),
    ("Quit", KeyAction::Quit),
];

const FORM_HELP: [(&str, KeyAction); 6] = [
    ("Submit", KeyAction::Submit),
    ("Cancel", KeyAction::CloseModal),
    ("Next field", KeyAction::NextField),
    ("Previous field", KeyAction::PrevField),
    ("Dismiss server error", KeyAction::DismissServerError),
    ("Dismiss validation summary", KeyAction::DismissValidation),
];

fn section<'a>(lines: &mut Vec<Line<'a>>, title: &'a str, entries: &[(&'a str, KeyAction)], app: &AppState) {
    lines.push(Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (label, action) in entries {
        let keys = app.keymap.keys_for(*action);
        lines.push(Line::from(vec![
            Span::raw(format!("  {label:<28}")),
            Span::styled(
                if keys.is_empty() { "-".to_string() } else { keys.join(" / ") },
                Style::default().add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
    lines.push(Line::raw(""));
}

/// Render the help overlay listing the current key bindings.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let width = 70u16.min(area.width.saturating_sub(4));
    let height = 24u16.min(area.height.saturating_sub(2));
    let rect = centered_rect(width, height, area);

    let mut lines: Vec<Line> = Vec::new();
    section(&mut lines, "Dashboard", &DASHBOARD_HELP, app);
    section(&mut lines, "Form", &FORM_HELP, app);
    lines.push(Line::from(Span::styled(
        "Any key closes this help",
        Style::default().fg(app.theme.muted),
    )));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Help")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
