//! HTTP request handlers.

pub mod assets;
pub mod chunk_upload;
pub mod health;
pub mod logos;
pub mod upload;
