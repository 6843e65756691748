pub mod handlers;
pub mod routes;
pub mod services;

/// Resource name used for export filenames.
pub const RESOURCE: &str = "athletes";
