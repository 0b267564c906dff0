use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::app::{App, StreamStatus};

fn stream_span(status: &StreamStatus) -> Span<'static> {
    match status {
        StreamStatus::Loading => Span::styled("Loading…", Style::default().fg(Color::Yellow)),
        StreamStatus::Finished { total } => Span::styled(
            format!("Done ({} records)", total),
            Style::default().fg(Color::Green),
        ),
        StreamStatus::Failed(message) => Span::styled(
            format!("Error: {}", message),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    }
}

/// Draw the status bar: record count, stream state, source and scroll position
pub fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::raw(format!(" {} records | ", app.records().len())),
        stream_span(&app.status),
    ];

    if !app.source_label.is_empty() {
        spans.push(Span::raw(format!(" | {}", app.source_label)));
    }
    spans.push(Span::raw(" "));
    if let Some((first, last)) = app.window_rows() {
        spans.push(Span::raw(format!("rows {first}-{last} ")));
    }

    // Follow indicator, as in tail -f
    spans.push(if app.auto_scroll {
        Span::styled(
            "[TAIL]",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            format!("[SCROLL {}%]", app.scroll_percent()),
            Style::default().fg(Color::Yellow),
        )
    });

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(40, 40, 40)));

    f.render_widget(paragraph, area);
}
