//! Database repositories for data access layer
//!
//! Repository implementations over the service's SQLite database. Each
//! repository owns a pool handle and provides the queries for one domain
//! entity.

pub mod db;

pub use db::logo_cache::LogoCacheRepository;
