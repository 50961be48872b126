//! Database repositories.

pub mod logo_cache;
