use crate::domain::model::{PlanId, StudentId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Start date {start_date} is in the past")]
    PastDate { start_date: String },

    #[error("Student {student_id} already has an active enrollment")]
    AlreadyEnrolled { student_id: StudentId },

    #[error("Student {student_id} not found")]
    StudentNotFound { student_id: StudentId },

    #[error("Plan {plan_id} not found")]
    PlanNotFound { plan_id: PlanId },

    #[error("Student {student_id} has no enrollment")]
    NotEnrolled { student_id: StudentId },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("Notification failed: {message}")]
    NotificationError { message: String },
}

/// Client-facing failure kinds. An outer transport maps these to its own
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    PastDate,
    AlreadyEnrolled,
    StudentNotFound,
    PlanNotFound,
    NotEnrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Storage,
    Configuration,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EnrollmentError {
    pub fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config(field: &str, message: impl Into<String>) -> Self {
        Self::ConfigError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// `None` for infrastructure failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::InvalidInput { .. } => Some(ErrorKind::InvalidInput),
            Self::PastDate { .. } => Some(ErrorKind::PastDate),
            Self::AlreadyEnrolled { .. } => Some(ErrorKind::AlreadyEnrolled),
            Self::StudentNotFound { .. } => Some(ErrorKind::StudentNotFound),
            Self::PlanNotFound { .. } => Some(ErrorKind::PlanNotFound),
            Self::NotEnrolled { .. } => Some(ErrorKind::NotEnrolled),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::IoError(_) | Self::SerializationError(_) | Self::StorageError { .. } => {
                ErrorCategory::Storage
            }
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::NotificationError { .. } => ErrorCategory::Delivery,
            _ => ErrorCategory::Client,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Client => ErrorSeverity::Medium,
            ErrorCategory::Delivery => ErrorSeverity::Low,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Process exit status for a command that failed with this error.
    /// Never zero: a failed command must not look successful to scripts.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
            ErrorSeverity::Low | ErrorSeverity::High => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("The value given for '{}' is not valid: {}", field, reason)
            }
            Self::PastDate { start_date } => {
                format!("Enrollments cannot start in the past ({})", start_date)
            }
            Self::AlreadyEnrolled { student_id } => {
                format!("Student {} is already enrolled", student_id)
            }
            Self::StudentNotFound { student_id } => {
                format!("No student with id {}", student_id)
            }
            Self::PlanNotFound { plan_id } => format!("No plan with id {}", plan_id),
            Self::NotEnrolled { student_id } => {
                format!("Student {} is not enrolled", student_id)
            }
            Self::IoError(_) | Self::SerializationError(_) | Self::StorageError { .. } => {
                "The enrollment store could not be read or written".to_string()
            }
            Self::ConfigError { field, .. } => {
                format!("The configuration value '{}' is invalid", field)
            }
            Self::NotificationError { .. } => {
                "The confirmation message could not be sent".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "Check the ids and use an ISO-8601 start date",
            Self::PastDate { .. } => "Pick a start date from the current hour onwards",
            Self::AlreadyEnrolled { .. } => "Update or delete the existing enrollment instead",
            Self::StudentNotFound { .. } | Self::PlanNotFound { .. } => {
                "Run the 'catalog' command to see the known students and plans"
            }
            Self::NotEnrolled { .. } => "Create an enrollment for this student first",
            Self::IoError(_) | Self::SerializationError(_) | Self::StorageError { .. } => {
                "Check that the data directory exists and the store file is valid JSON"
            }
            Self::ConfigError { .. } => "Fix the configuration file and run again",
            Self::NotificationError { .. } => "Check the notifier settings and the outbox directory",
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrollmentError>;
