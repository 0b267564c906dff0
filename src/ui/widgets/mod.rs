mod histogram;
mod log_table;
mod status_bar;

pub use histogram::draw_histogram;
pub use log_table::{draw_log_table, TableRowRenderer, TIME_WIDTH};
pub use status_bar::draw_status_bar;
