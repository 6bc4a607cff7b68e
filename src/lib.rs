pub mod cli;
pub mod config;
pub mod constants;
pub mod feeder;
pub mod loader;
pub mod logging;
pub mod publisher;
pub mod tail;
pub mod tick;
