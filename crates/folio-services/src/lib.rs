//! Folio Services Library
//!
//! Application services: the chunked-upload session store and persistence
//! pipeline, and the logo resolution cache.

pub mod logo;
pub mod upload;

// Re-export commonly used types
pub use logo::fetcher::{FetchedImage, HttpLogoFetcher, LogoFetcher};
pub use logo::providers::{ClearbitProvider, GoogleImageSearchProvider, LogoProvider};
pub use logo::resolver::LogoResolver;
pub use upload::pipeline::persist_upload;
pub use upload::session_store::{AssembledUpload, ChunkOutcome, ChunkStore, ChunkUpload};
