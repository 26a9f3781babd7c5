pub mod auth;
pub mod best_effort;
pub mod change_feed;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;

// Re-export common error type
pub use error::{FieldError, FolioError, Result};
