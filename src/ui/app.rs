use crate::histogram::DayHistogram;
use crate::log::{json_line_count, LogRecord};
use crate::worker::WorkerMessage;
use super::virtual_list::{VirtualList, DEFAULT_OVERSCAN};

/// Row geometry and layout knobs for the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Height of a collapsed row, in terminal rows
    pub row_height: u32,
    pub overscan: usize,
    /// Height of one pretty-printed JSON line in an expanded row
    pub expanded_line_height: u32,
    /// Extra height added below the JSON of an expanded row
    pub expanded_padding: u32,
    pub histogram_height: u16,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row_height: 1,
            overscan: DEFAULT_OVERSCAN,
            expanded_line_height: 1,
            expanded_padding: 0,
            histogram_height: 8,
        }
    }
}

/// Where the ingestion stream stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Loading,
    Finished { total: u64 },
    Failed(String),
}

/// Application state for the TUI
pub struct App {
    /// Every record received so far, in stream order
    records: Vec<LogRecord>,
    /// Windowing over `records`
    pub list: VirtualList,
    histogram: DayHistogram,
    /// Index of the highlighted row
    selected: Option<usize>,
    /// Whether to stick to the newest record as batches arrive
    pub auto_scroll: bool,
    pub status: StreamStatus,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Shown in the status bar
    pub source_label: String,
    config: ViewConfig,
}

impl App {
    pub fn new(config: ViewConfig) -> Self {
        Self {
            records: Vec::new(),
            list: VirtualList::new(config.row_height, 0).with_overscan(config.overscan),
            histogram: DayHistogram::new(),
            selected: None,
            auto_scroll: true,
            status: StreamStatus::Loading,
            should_quit: false,
            source_label: String::new(),
            config,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn histogram(&self) -> &DayHistogram {
        &self.histogram
    }

    pub fn view_config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Fold one worker message into the view
    pub fn apply_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Batch(batch) => self.append_batch(batch),
            WorkerMessage::EndOfStream { total } => {
                self.status = StreamStatus::Finished { total };
            }
            WorkerMessage::Error(message) => {
                self.status = StreamStatus::Failed(message);
            }
        }
    }

    /// Append a batch in arrival order. Existing rows keep their index and
    /// expansion state.
    pub fn append_batch(&mut self, batch: Vec<LogRecord>) {
        if batch.is_empty() {
            return;
        }
        self.histogram.ingest(&batch);
        self.records.extend(batch);
        self.list.set_item_count(self.records.len());

        if self.auto_scroll {
            self.select(self.records.len() - 1);
            self.list.scroll_to_bottom();
        }
    }

    /// Called by the renderer once the table's height is known
    pub fn set_viewport_height(&mut self, height: u16) {
        let at_bottom = self.list.is_at_bottom();
        self.list.set_viewport_height(height as u32);
        if self.auto_scroll && at_bottom {
            self.list.scroll_to_bottom();
        } else if let Some(index) = self.selected {
            self.list.ensure_visible(index);
        }
    }

    /// Height an expanded record adds to its row
    pub fn expanded_extra(&self, record: &LogRecord) -> u32 {
        let lines = u32::try_from(json_line_count(record.event())).unwrap_or(u32::MAX);
        lines
            .saturating_mul(self.config.expanded_line_height)
            .saturating_add(self.config.expanded_padding)
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.list.is_expanded(index)
    }

    /// Expand or collapse the selected record. Returns the new state.
    pub fn toggle_selected(&mut self) -> bool {
        let Some(index) = self.selected else {
            return false;
        };
        let Some(record) = self.records.get(index) else {
            return false;
        };
        let extra = self.expanded_extra(record);
        let expanded = self.list.toggle(index, extra);
        self.list.ensure_visible(index);
        expanded
    }

    pub fn collapse_all(&mut self) {
        self.list.clear_expanded();
        if let Some(index) = self.selected {
            self.list.ensure_visible(index);
        }
    }

    pub fn select_next(&mut self) {
        match self.selected {
            Some(index) => self.move_selection(index as i64 + 1),
            None => self.move_selection(0),
        }
    }

    pub fn select_prev(&mut self) {
        match self.selected {
            Some(index) => self.move_selection(index as i64 - 1),
            None => self.move_selection(0),
        }
    }

    pub fn page_down(&mut self) {
        let page = self.page_rows() as i64;
        let from = self.selected.unwrap_or(0) as i64;
        self.move_selection(from + page);
    }

    pub fn page_up(&mut self) {
        let page = self.page_rows() as i64;
        let from = self.selected.unwrap_or(0) as i64;
        self.move_selection(from - page);
    }

    pub fn select_first(&mut self) {
        self.auto_scroll = false;
        if !self.records.is_empty() {
            self.select(0);
        }
        self.list.scroll_to_top();
    }

    /// Jump to the newest record and follow new ones
    pub fn select_last(&mut self) {
        self.auto_scroll = true;
        if !self.records.is_empty() {
            self.select(self.records.len() - 1);
        }
        self.list.scroll_to_bottom();
    }

    /// Scroll the view without moving the selection
    pub fn scroll_by(&mut self, rows: i64) {
        self.list.scroll_by(rows * self.config.row_height as i64);
        self.auto_scroll = rows > 0 && self.list.is_at_bottom();
    }

    /// How far down the content the view is, 0-100
    pub fn scroll_percent(&self) -> u16 {
        let max = self.list.max_scroll_offset();
        if max == 0 {
            return 100;
        }
        let view = self.list.viewport();
        ((view.scroll_offset.min(max) * 100) / max) as u16
    }

    /// First and last row on screen, 1-based
    pub fn window_rows(&self) -> Option<(usize, usize)> {
        let view = self.list.viewport();
        if view.start_index >= view.end_index {
            return None;
        }
        let bottom = view.scroll_offset + view.visible_height.saturating_sub(1) as u64;
        let last = self.list.index_at(bottom).clamp(view.start_index, view.end_index - 1);
        Some((view.start_index + 1, last + 1))
    }

    fn page_rows(&self) -> usize {
        (self.list.viewport_height() / self.config.row_height.max(1)).max(1) as usize
    }

    fn move_selection(&mut self, target: i64) {
        if self.records.is_empty() {
            return;
        }
        let last = self.records.len() as i64 - 1;
        let index = target.clamp(0, last) as usize;
        self.auto_scroll = false;
        self.select(index);
    }

    fn select(&mut self, index: usize) {
        self.selected = Some(index);
        self.list.ensure_visible(index);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}
