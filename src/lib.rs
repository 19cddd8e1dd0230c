pub mod cli;
pub mod config;
pub mod error;
pub mod interval;
pub mod labels;
pub mod notify;
pub mod platform;
pub mod report;
pub mod schedule;
pub mod sdk;
pub mod source;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
