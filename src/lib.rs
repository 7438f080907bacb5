pub mod client;
pub mod config;
pub mod engine;
pub mod errors;
pub mod job;
pub mod poll;
pub mod progress;
pub mod status;
pub mod ui;
