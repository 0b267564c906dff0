// Library exports for logscope
// This allows the test suite to import modules

pub mod cli;
pub mod config;
pub mod error;
pub mod event_handler;
pub mod headless;
pub mod histogram;
pub mod log;
pub mod logging;
pub mod ui;
pub mod worker;
