use std::collections::BTreeMap;
use std::ops::Range;

/// Extra rows rendered past the visible area
pub const DEFAULT_OVERSCAN: usize = 5;

/// Snapshot of what the list currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub scroll_offset: u64,
    pub visible_height: u32,
    pub start_index: usize,
    pub end_index: usize,
}

/// Turns one item into whatever the front-end draws.
///
/// The list only decides which rows exist and how tall they are; what a row
/// looks like is entirely up to the renderer.
pub trait RowRenderer<T> {
    type Row;

    fn render(&self, index: usize, data: &T, expanded: bool, height: u32) -> Self::Row;
}

/// Rows produced for the current window.
///
/// `translate_y` is the offset of the first rendered row from the top of the
/// content, so `scroll_offset - translate_y` is how much of that row is
/// scrolled out of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedWindow<R> {
    pub start_index: usize,
    pub end_index: usize,
    pub translate_y: u64,
    pub rows: Vec<R>,
}

/// Windowed list of variable-height rows.
///
/// Every row is `item_size` tall plus, while expanded, an extra height given
/// at toggle time. Only expanded rows are stored, so the offset of a row is
/// `index * item_size` plus the extras of expanded rows above it. Offset,
/// total height and scroll-to-index lookups walk the expanded rows only:
/// O(k) for k expanded rows, independent of the item count.
#[derive(Debug, Clone)]
pub struct VirtualList {
    item_size: u32,
    viewport_height: u32,
    overscan: usize,
    item_count: usize,
    expanded: BTreeMap<usize, u32>,
    expanded_extra: u64,
    scroll_offset: u64,
    start_index: usize,
}

impl VirtualList {
    pub fn new(item_size: u32, viewport_height: u32) -> Self {
        Self {
            item_size: item_size.max(1),
            viewport_height,
            overscan: DEFAULT_OVERSCAN,
            item_count: 0,
            expanded: BTreeMap::new(),
            expanded_extra: 0,
            scroll_offset: 0,
            start_index: 0,
        }
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn item_size(&self) -> u32 {
        self.item_size
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn start_index(&self) -> usize {
        self.start_index
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        if item_count < self.item_count {
            let dropped = self.expanded.split_off(&item_count);
            self.expanded_extra -= dropped.values().map(|&extra| extra as u64).sum::<u64>();
        }
        self.item_count = item_count;
        self.refresh();
    }

    pub fn set_viewport_height(&mut self, viewport_height: u32) {
        if viewport_height != self.viewport_height {
            self.viewport_height = viewport_height;
            self.refresh();
        }
    }

    /// Scroll to an absolute offset, clamped to the scrollable range
    pub fn scroll_to(&mut self, offset: u64) {
        self.scroll_offset = offset;
        self.refresh();
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let offset = if delta < 0 {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_offset.saturating_add(delta as u64)
        };
        self.scroll_to(offset);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_to(0);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_to(self.max_scroll_offset());
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_height().saturating_sub(self.viewport_height as u64)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset >= self.max_scroll_offset()
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains_key(&index)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Expand a collapsed row by `extra` or collapse an expanded one.
    ///
    /// Returns whether the row is expanded afterwards. Out-of-range indices
    /// are ignored. Only this row's height changes; rows below it move.
    pub fn toggle(&mut self, index: usize, extra: u32) -> bool {
        if index >= self.item_count {
            return false;
        }
        let expanded = match self.expanded.remove(&index) {
            Some(previous) => {
                self.expanded_extra -= previous as u64;
                false
            }
            None => {
                self.expanded.insert(index, extra);
                self.expanded_extra += extra as u64;
                true
            }
        };
        self.refresh();
        expanded
    }

    pub fn clear_expanded(&mut self) {
        self.expanded.clear();
        self.expanded_extra = 0;
        self.refresh();
    }

    pub fn row_height(&self, index: usize) -> u32 {
        self.item_size + self.expanded.get(&index).copied().unwrap_or(0)
    }

    /// Distance from the top of the content to the top of row `index`.
    /// `row_offset(item_count)` equals the total height.
    pub fn row_offset(&self, index: usize) -> u64 {
        let index = index.min(self.item_count);
        let extras: u64 = self.expanded.range(..index).map(|(_, &extra)| extra as u64).sum();
        index as u64 * self.item_size as u64 + extras
    }

    pub fn total_height(&self) -> u64 {
        self.item_count as u64 * self.item_size as u64 + self.expanded_extra
    }

    /// The row covering `offset`: the smallest index whose bottom edge lies below it.
    /// Offsets past the end resolve to the last row.
    pub fn index_at(&self, offset: u64) -> usize {
        if self.item_count == 0 {
            return 0;
        }
        let base = self.item_size as u64;
        let mut row = 0usize;
        let mut top = 0u64;

        for (&index, &extra) in &self.expanded {
            let plain = (index - row) as u64 * base;
            if offset < top + plain {
                return row + ((offset - top) / base) as usize;
            }
            top += plain;

            let height = base + extra as u64;
            if offset < top + height {
                return index;
            }
            top += height;
            row = index + 1;
        }

        let index = row + ((offset - top) / base) as usize;
        index.min(self.item_count - 1)
    }

    /// Rows to render: from the row under the scroll offset, enough rows to
    /// fill the viewport at base height, plus the overscan
    pub fn visible_range(&self) -> Range<usize> {
        let start = self.start_index;
        let span = (self.viewport_height as usize).div_ceil(self.item_size as usize).max(1);
        let end = start.saturating_add(span + self.overscan).min(self.item_count);
        start..end
    }

    pub fn viewport(&self) -> Viewport {
        let range = self.visible_range();
        Viewport {
            scroll_offset: self.scroll_offset,
            visible_height: self.viewport_height,
            start_index: range.start,
            end_index: range.end,
        }
    }

    /// Scroll the least amount needed to bring row `index` into view
    pub fn ensure_visible(&mut self, index: usize) {
        if index >= self.item_count {
            return;
        }
        let top = self.row_offset(index);
        let height = self.row_height(index) as u64;
        let view = self.viewport_height as u64;

        if top < self.scroll_offset {
            self.scroll_to(top);
        } else if top + height > self.scroll_offset + view {
            let target = if height > view { top } else { top + height - view };
            self.scroll_to(target);
        }
    }

    /// Render the current window with `renderer`
    pub fn render<T, R>(&self, items: &[T], renderer: &R) -> RenderedWindow<R::Row>
    where
        R: RowRenderer<T>,
    {
        let range = self.visible_range();
        let end = range.end.min(items.len());
        let start = range.start.min(end);

        let rows = (start..end)
            .map(|index| {
                renderer.render(
                    index,
                    &items[index],
                    self.is_expanded(index),
                    self.row_height(index),
                )
            })
            .collect();

        RenderedWindow {
            start_index: start,
            end_index: end,
            translate_y: self.row_offset(start),
            rows,
        }
    }

    fn refresh(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset());
        self.start_index = self.index_at(self.scroll_offset);
    }
}

/// Zebra striping follows the absolute index so stripes stay put while scrolling
pub fn is_even_row(index: usize) -> bool {
    index % 2 == 0
}
