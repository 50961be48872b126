//! Data models for the application
//!
//! Domain structures shared across crates, organized by feature area.

mod logo;
mod media;
mod upload;

// Re-export all models for convenient imports
pub use logo::*;
pub use media::*;
pub use upload::*;
