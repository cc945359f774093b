//! Date-range retrieval of stored social-media posts and emotion
//! classification written back onto each post.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod openapi;
pub mod query;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use handlers::{configure, AppState};
