use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::api::{field_str, record_id};
use crate::app::AppState;
use crate::entity::records::field_specs;
use crate::entity::{FieldInput, FieldSpec};

const MAX_COLUMNS: usize = 4;

fn visible_columns(app: &AppState) -> Vec<&'static FieldSpec> {
    field_specs(app.active_kind)
        .iter()
        .filter(|f| f.input != FieldInput::Secret)
        .take(MAX_COLUMNS)
        .collect()
}

pub fn render_records_table(f: &mut Frame, area: Rect, app: &mut AppState) {
    let body_height = area.height.saturating_sub(3) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let columns = visible_columns(app);
    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(app.rows.len());
    let slice = &app.rows[start..end];

    let rows = slice.iter().enumerate().map(|(i, record)| {
        let absolute_index = start + i;
        let style = if absolute_index == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        let mut cells = vec![Cell::from(record_id(record).unwrap_or("-").to_string())];
        cells.extend(
            columns
                .iter()
                .map(|c| Cell::from(field_str(record, c.key).to_string())),
        );
        Row::new(cells).style(style)
    });

    let mut widths = vec![Constraint::Length(5)];
    let share = 100 / columns.len().max(1) as u16;
    widths.extend(columns.iter().map(|_| Constraint::Percentage(share)));

    let mut header_cells = vec!["ID".to_string()];
    header_cells.extend(columns.iter().map(|c| c.label.to_uppercase()));
    let header = Row::new(header_cells).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    let title = format!("{} ({})", app.active_kind.plural(), app.rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .column_spacing(1);

    f.render_widget(table, area);
}

pub fn render_record_details(f: &mut Frame, area: Rect, app: &AppState) {
    let text = match app.selected_record() {
        Some(record) => {
            let mut lines = vec![format!("Id: {}", record_id(record).unwrap_or("-"))];
            for spec in field_specs(app.active_kind)
                .iter()
                .filter(|f| f.input != FieldInput::Secret)
            {
                let value = field_str(record, spec.key);
                lines.push(format!(
                    "{}: {}",
                    spec.label,
                    if value.is_empty() { "-" } else { value }
                ));
            }
            lines.join("\n")
        }
        None => format!("No {} to show. Press n to create one.", app.active_kind),
    };
    let p = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(app.theme.text))
        .block(
            Block::default()
                .title("Details")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(p, area);
}
