pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use adapters::{DocumentRepository, LocalStorage, LogNotifier, MemoryStorage, OutboxNotifier, QueuedNotifier};
pub use config::AppConfig;
pub use crate::core::service::EnrollmentService;
pub use domain::ports::{FixedClock, SystemClock};
pub use utils::error::{EnrollmentError, ErrorKind, Result};
