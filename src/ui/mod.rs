pub mod components;
pub mod form;
pub mod records;

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode};
use crate::entity::EntityKind;

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)].as_ref())
        .split(root[1]);

    let mut spans = Vec::new();
    for kind in EntityKind::ALL {
        let style = if kind == app.active_kind {
            Style::default()
                .fg(app.theme.highlight_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.header_fg)
        };
        let label = if kind == app.active_kind {
            format!("[{}]", kind.plural())
        } else {
            kind.plural().to_string()
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw("  "));
    }
    if app.input_mode == InputMode::Search || !app.search_query.is_empty() {
        spans.push(Span::styled(
            format!("Search: {}", app.search_query),
            Style::default().fg(app.theme.warning),
        ));
    }
    let p = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .title("eduadmin")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    records::render_records_table(f, body[0], app);
    records::render_record_details(f, body[1], app);

    components::render_status_bar(f, root[2], app);

    if let Some(session) = &app.session {
        let view = session.view(Instant::now());
        form::render_form(f, f.area(), &view, &app.theme);
    }
    if app.input_mode == InputMode::Help {
        components::render_help_modal(f, f.area(), app);
    }
}
