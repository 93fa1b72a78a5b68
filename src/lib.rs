mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod format;
pub mod model;
pub mod select;

pub use api::{Mode, TEST_MODE_ENV};
pub use config::{Config, Secret, WebhookConfig};
pub use error::{Error, ErrorType, IntoResult, Result};
