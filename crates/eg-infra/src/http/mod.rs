mod client;
mod content_source;
mod preferences;

pub use client::ApiConfig;
pub use content_source::HttpContentSource;
pub use preferences::HttpPreferences;
