use crate::utils::error::{EnrollmentError, Result};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(EnrollmentError::invalid_input(field_name, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(EnrollmentError::invalid_input(
            field_name,
            "Path contains null bytes",
        ));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(EnrollmentError::invalid_input(
            field_name,
            format!("Value must be at least {}, got {}", min_value, value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EnrollmentError::invalid_input(
            field_name,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EnrollmentError::invalid_input(
            field_name,
            format!("Value {} must be between {} and {}", value, min, max),
        ));
    }
    Ok(())
}

/// Shape check only; deliverability is the mailer's problem.
pub fn validate_email(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(EnrollmentError::invalid_input(
            field_name,
            format!("'{}' is not an email address", value),
        )),
    }
}

pub fn validate_unique<T: Eq + Hash + Display>(
    field_name: &str,
    values: impl IntoIterator<Item = T>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for value in values {
        if seen.contains(&value) {
            return Err(EnrollmentError::invalid_input(
                field_name,
                format!("Duplicate value {}", value),
            ));
        }
        seen.insert(value);
    }
    Ok(())
}

/// Re-labels an input error raised while checking configuration.
pub fn into_config_error(err: EnrollmentError) -> EnrollmentError {
    match err {
        EnrollmentError::InvalidInput { field, reason } => EnrollmentError::ConfigError {
            field,
            message: reason,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("store.data_dir", "./data").is_ok());
        assert!(validate_path("store.data_dir", "  ").is_err());
        assert!(validate_path("store.data_dir", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("student_id", 5, 1).is_ok());
        assert!(validate_positive_number("student_id", 0, 1).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "ada@example.com").is_ok());
        assert!(validate_email("email", "ada.example.com").is_err());
        assert!(validate_email("email", "@example.com").is_err());
        assert!(validate_email("email", "ada@localhost").is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("ids", [1, 2, 3]).is_ok());
        assert!(validate_unique("ids", [1, 2, 1]).is_err());
    }

    #[test]
    fn test_into_config_error() {
        let err = into_config_error(EnrollmentError::invalid_input("notifier.kind", "nope"));
        assert!(matches!(err, EnrollmentError::ConfigError { ref field, .. } if field == "notifier.kind"));
    }
}
