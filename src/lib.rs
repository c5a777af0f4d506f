mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
mod error;
pub mod model;
mod utils;


pub use api::{Mode, IN_TEST_MODE};
pub use config::Config;
pub use error::{Error, LoadError, Result};
