use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::log::{pretty_event, LogRecord};
use crate::ui::app::{App, StreamStatus};
use crate::ui::utils::{pad_to_width, single_line, truncate_with_ellipsis};
use crate::ui::virtual_list::{is_even_row, RowRenderer};

/// Columns of an ISO-8601 timestamp with milliseconds
pub const TIME_WIDTH: usize = 24;
const CARET_WIDTH: usize = 2;
const JSON_INDENT: &str = "    ";

const ODD_ROW_BG: Color = Color::Rgb(40, 40, 40);

fn row_style(index: usize, selected: bool) -> Style {
    let style = if is_even_row(index) {
        Style::default()
    } else {
        Style::default().bg(ODD_ROW_BG)
    };
    if selected {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

/// Renders a record as terminal lines: a summary line, then the
/// pretty-printed event while expanded. Always returns exactly `height` lines.
pub struct TableRowRenderer {
    width: usize,
    selected: Option<usize>,
    expanded_line_height: u32,
}

impl TableRowRenderer {
    pub fn new(width: u16, selected: Option<usize>, expanded_line_height: u32) -> Self {
        Self {
            width: width as usize,
            selected,
            expanded_line_height: expanded_line_height.max(1),
        }
    }
}

impl RowRenderer<LogRecord> for TableRowRenderer {
    type Row = Vec<Line<'static>>;

    fn render(&self, index: usize, record: &LogRecord, expanded: bool, height: u32) -> Self::Row {
        let style = row_style(index, self.selected == Some(index));
        let caret = if expanded { "▼ " } else { "▶ " };
        let event_width = self.width.saturating_sub(CARET_WIDTH + TIME_WIDTH + 1);

        let summary = Line::from(vec![
            Span::styled(caret, Style::default().fg(Color::DarkGray)),
            Span::styled(
                pad_to_width(record.time(), TIME_WIDTH),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" "),
            Span::raw(truncate_with_ellipsis(&single_line(record.event()), event_width)),
        ])
        .style(style);

        let mut lines = vec![summary];
        if expanded {
            let json_width = self.width.saturating_sub(JSON_INDENT.len());
            for json_line in pretty_event(record.event()).split('\n') {
                let text = truncate_with_ellipsis(&single_line(json_line), json_width);
                lines.push(
                    Line::from(vec![
                        Span::raw(JSON_INDENT),
                        Span::styled(text, Style::default().fg(Color::Green)),
                    ])
                    .style(style),
                );
                for _ in 1..self.expanded_line_height {
                    lines.push(Line::default().style(style));
                }
            }
        }
        lines.resize(height as usize, Line::default().style(style));
        lines
    }
}

fn header_line(width: u16) -> Line<'static> {
    let text = format!("{}{} Event", " ".repeat(CARET_WIDTH), pad_to_width("Time", TIME_WIDTH));
    Line::from(truncate_with_ellipsis(&text, width as usize))
        .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::White))
}

fn empty_message(status: &StreamStatus) -> &str {
    match status {
        StreamStatus::Loading => "Waiting for records...",
        StreamStatus::Finished { .. } => "The stream contained no records",
        StreamStatus::Failed(message) => message,
    }
}

/// Draw the record table with only the visible window materialized
pub fn draw_log_table(f: &mut Frame, area: Rect, app: &mut App) {
    if area.height == 0 {
        return;
    }
    let header = Rect { height: 1, ..area };
    let body = Rect {
        y: area.y + 1,
        height: area.height - 1,
        ..area
    };
    f.render_widget(Paragraph::new(header_line(area.width)), header);

    app.set_viewport_height(body.height);

    if app.records().is_empty() {
        let message = Paragraph::new(Line::from(empty_message(&app.status).to_string()))
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(message, body);
        return;
    }

    let renderer = TableRowRenderer::new(
        body.width,
        app.selected(),
        app.view_config().expanded_line_height,
    );
    let window = app.list.render(app.records(), &renderer);

    // The first rendered row may be partly scrolled out at the top
    let hidden = app.list.scroll_offset().saturating_sub(window.translate_y) as usize;
    let lines: Vec<Line> = window
        .rows
        .into_iter()
        .flatten()
        .skip(hidden)
        .take(body.height as usize)
        .collect();

    f.render_widget(Paragraph::new(lines), body);
}
