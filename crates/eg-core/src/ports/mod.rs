//! Port interfaces for the application layer
//!
//! Ports define the contract between the pipeline logic and the
//! infrastructure implementations. This follows Hexagonal Architecture
//! principles, allowing the core business logic to remain independent of
//! external dependencies: the HTTP transport, the preference store, the
//! toast presenter and the wall clock all live behind a trait here.

pub mod clock;
pub mod content_source;
pub mod display;
pub mod notifier;
pub mod preferences;

pub use clock::ClockPort;
pub use content_source::{ContentSourceError, ContentSourcePort};
pub use display::{AdvancePort, DisplayEventPort};
pub use notifier::{NoticeKind, NotifierPort};
pub use preferences::PreferencesPort;
