pub mod api;
pub mod config;
pub mod schedule;
pub mod schema;
pub mod snapshot;

pub use crate::config::Config;
