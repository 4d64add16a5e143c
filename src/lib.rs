// Public API for integration tests and the binary

pub mod api;
pub mod bank;
pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod error;
pub mod protocol;
pub mod replication;
pub mod sanitize;
pub mod state;
pub mod types;
pub mod ws;
