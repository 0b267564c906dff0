use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use super::app::App;
use super::widgets::{draw_histogram, draw_log_table, draw_status_bar};

/// Draw the UI to the terminal
pub fn draw(f: &mut Frame, app: &mut App) {
    let histogram_height = app.view_config().histogram_height;

    // Histogram, record table, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(histogram_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    if histogram_height > 0 {
        draw_histogram(f, chunks[0], app.histogram());
    }
    draw_log_table(f, chunks[1], app);
    draw_status_bar(f, chunks[2], app);
}
