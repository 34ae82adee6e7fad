pub mod config;
pub mod logging;
pub mod plot;
pub mod runner;
pub mod summary;
