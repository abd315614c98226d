//! Form modal overlay drawn from a [`FormView`] snapshot.
//!
//! Layout, top to bottom: subtitle, validation summary banner, server error
//! banner, one line per field (plus its error), then the submit footer.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::session::FormView;
use crate::app::{Theme, parse_color};
use crate::modal::Mode;
use crate::ui::components::centered_rect;

const LABEL_WIDTH: usize = 28;

pub fn render_form(f: &mut Frame, area: Rect, view: &FormView, theme: &Theme) {
    let accent = parse_color(view.config.color_from).unwrap_or(theme.title);
    let accent_alt = parse_color(view.config.color_to).unwrap_or(theme.border);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            view.config.subtitle,
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )),
        Line::raw(""),
    ];

    if let Some(summary) = &view.validation_summary {
        lines.push(Line::from(Span::styled(
            "Please fix the following:",
            Style::default().fg(theme.warning).add_modifier(Modifier::BOLD),
        )));
        for item in summary {
            lines.push(Line::from(Span::styled(
                format!("  • {item}"),
                Style::default().fg(theme.warning),
            )));
        }
        lines.push(Line::raw(""));
    }

    if let Some(message) = &view.server_error {
        lines.push(Line::from(vec![
            Span::styled("✗ ", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
            Span::styled(message.clone(), Style::default().fg(theme.error)),
        ]));
        lines.push(Line::raw(""));
    }

    for row in &view.rows {
        let marker = if row.focused && view.mode != Mode::View { "▶ " } else { "  " };
        let label = if row.required && view.mode != Mode::View {
            format!("{}*", row.label)
        } else {
            row.label.to_string()
        };
        let mut value_style = Style::default().fg(theme.text);
        if row.error.is_some() {
            value_style = value_style.fg(theme.error);
        }
        if row.focused && view.mode != Mode::View {
            value_style = value_style.add_modifier(Modifier::UNDERLINED);
        }
        if row.pulsing {
            value_style = value_style
                .bg(theme.error)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD);
        }
        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(accent)),
            Span::styled(
                format!("{label:<width$}", width = LABEL_WIDTH),
                Style::default().fg(theme.muted),
            ),
            Span::styled(row.value.clone(), value_style),
        ]));
        if let Some(error) = &row.error {
            lines.push(Line::from(Span::styled(
                format!("  {:<width$}{error}", "", width = LABEL_WIDTH),
                Style::default().fg(theme.error),
            )));
        }
    }

    lines.push(Line::raw(""));
    let button = if view.submitting {
        Span::styled(
            format!("[ {} ]", view.config.loading_text),
            Style::default().fg(theme.muted).add_modifier(Modifier::ITALIC),
        )
    } else if view.can_submit {
        Span::styled(
            format!("[ {} ]", view.config.submit_text),
            Style::default()
                .fg(Color::Black)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!("[ {} ]", view.config.submit_text),
            Style::default().fg(theme.muted),
        )
    };
    let hint = match view.mode {
        Mode::View => "  Enter: close",
        Mode::Create | Mode::Edit => "  Enter: submit  Esc: cancel",
    };
    lines.push(Line::from(vec![
        button,
        Span::styled(hint, Style::default().fg(theme.muted)),
    ]));

    let width = 72u16.min(area.width.saturating_sub(4));
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let rect = centered_rect(width, height, area);
    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", view.config.icon),
            Style::default().fg(accent_alt),
        ),
        Span::styled(
            format!("{} ", view.config.title),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    ]);
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
