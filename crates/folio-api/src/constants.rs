//! API constants.

/// API base path prefix for versioned routes.
pub const API_PREFIX: &str = "/api/v0";

/// Route prefix under which stored assets are served.
pub const FILES_PREFIX: &str = "/files";

/// Path serving the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api/openapi.json";
