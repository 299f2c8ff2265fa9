//! frp-watch: polls frp tunnel status and reports transitions to a chat gateway.

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod message;
pub mod models;
pub mod notify;
pub mod source;
