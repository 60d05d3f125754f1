// Adapters layer: concrete implementations of the domain ports.

pub mod notifier;
pub mod queue;
pub mod repository;
pub mod storage;

pub use notifier::{ConfirmationMessage, LogNotifier, OutboxNotifier};
pub use queue::{DeliveryStats, QueuedNotifier};
pub use repository::DocumentRepository;
pub use storage::{LocalStorage, MemoryStorage};
