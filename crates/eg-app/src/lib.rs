//! Epigram pipeline orchestration layer
//!
//! This crate contains the two stateful components of the client-side
//! content-delivery pipeline (the prefetching queue and the auto-advance
//! countdown) plus the composition glue that wires them to the collaborator
//! ports without coupling them to each other.

pub mod coordinator;
pub mod services;

pub use coordinator::DisplayCoordinator;
pub use services::auto_advance::{AutoAdvanceTimer, TimerStatus};
pub use services::queue::{ContentAvailability, EpigramQueue, QueueConfig, QueueSnapshot};
