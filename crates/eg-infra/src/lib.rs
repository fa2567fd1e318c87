//! Infrastructure adapters for the epigram pipeline ports.
//!
//! Everything here implements an `eg-core` port against a concrete backend:
//! the REST API, the system clock, the log stream. The application layer
//! never sees these types directly.

pub mod http;
pub mod notify;
pub mod time;

pub use http::{ApiConfig, HttpContentSource, HttpPreferences};
pub use notify::TracingNotifier;
pub use time::SystemClock;
