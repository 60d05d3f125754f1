pub mod service;

pub use crate::domain::ports::{Clock, EnrollmentRepository, Notifier, Storage};
pub use crate::utils::error::Result;
pub use service::EnrollmentService;
