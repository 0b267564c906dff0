use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};

use crate::histogram::DayHistogram;

const BAR_GAP: u16 = 1;
const MAX_BAR_WIDTH: u16 = 10;

/// Width of each bar and how many of the newest buckets fit in `width`
fn bar_layout(bucket_count: usize, width: u16) -> (u16, usize) {
    if bucket_count == 0 || width == 0 {
        return (1, 0);
    }
    let room = width as usize + BAR_GAP as usize;
    let per_bar = room / bucket_count;
    if per_bar > BAR_GAP as usize {
        let bar_width = (per_bar - BAR_GAP as usize).min(MAX_BAR_WIDTH as usize) as u16;
        (bar_width, bucket_count)
    } else {
        // Too many days: show the newest ones at minimum width
        let fit = (room / (1 + BAR_GAP as usize)).max(1);
        (1, fit.min(bucket_count))
    }
}

/// Bar label: month and day, as much as the bar is wide
fn day_label(day: &str, bar_width: u16) -> String {
    let short = day.get(5..).unwrap_or(day);
    short.chars().take(bar_width as usize).collect()
}

/// Draw the per-day record counts
pub fn draw_histogram(f: &mut Frame, area: Rect, histogram: &DayHistogram) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .title(" Records per day ");
    let inner = block.inner(area);

    let buckets = histogram.buckets();
    let (bar_width, shown) = bar_layout(buckets.len(), inner.width);

    let bars: Vec<Bar> = buckets[buckets.len() - shown..]
        .iter()
        .map(|(day, count)| {
            Bar::default()
                .value(*count)
                .label(Line::from(day_label(day, bar_width)))
                .style(Style::default().fg(Color::Cyan))
                .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(BAR_GAP)
        .max(histogram.max_count().max(1));

    f.render_widget(chart, area);
}
