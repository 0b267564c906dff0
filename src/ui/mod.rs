mod app;
mod draw;
mod utils;
pub mod virtual_list;
mod widgets;

pub use app::{App, StreamStatus, ViewConfig};
pub use draw::draw;
pub use utils::truncate_with_ellipsis;
pub use virtual_list::{RenderedWindow, RowRenderer, Viewport, VirtualList};
pub use widgets::{TableRowRenderer, TIME_WIDTH};
