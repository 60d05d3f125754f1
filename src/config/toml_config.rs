use crate::domain::model::{Plan, Student};
use crate::utils::error::{EnrollmentError, Result};
use crate::utils::validation::{
    into_config_error, validate_email, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_unique, Validate,
};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

const NOTIFIER_KINDS: [&str; 2] = ["log", "outbox"];
const MAX_PLAN_MONTHS: u32 = 120;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub data_dir: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    pub kind: Option<String>,
    pub outbox_dir: Option<String>,
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierKind {
    Log,
    Outbox,
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrollmentError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content)
            .map_err(|e| EnrollmentError::config("toml_parsing", format!("TOML parsing error: {}", e)))
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay
    /// as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| EnrollmentError::config("toml_parsing", e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        self.check().map_err(into_config_error)
    }

    fn check(&self) -> Result<()> {
        validate_path("store.data_dir", &self.store.data_dir)?;
        validate_path("store.file_name", self.store_file_name())?;

        if let Some(kind) = &self.notifier.kind {
            if !NOTIFIER_KINDS.contains(&kind.as_str()) {
                return Err(EnrollmentError::invalid_input(
                    "notifier.kind",
                    format!(
                        "Unsupported notifier '{}'. Valid kinds: {}",
                        kind,
                        NOTIFIER_KINDS.join(", ")
                    ),
                ));
            }
        }
        if let Some(dir) = &self.notifier.outbox_dir {
            validate_path("notifier.outbox_dir", dir)?;
        }
        if let Some(capacity) = self.notifier.queue_capacity {
            validate_positive_number("notifier.queue_capacity", capacity as u64, 1)?;
        }

        validate_unique("catalog.students.id", self.catalog.students.iter().map(|s| s.id))?;
        for student in &self.catalog.students {
            validate_positive_number("catalog.students.id", student.id.0, 1)?;
            validate_non_empty_string("catalog.students.name", &student.name)?;
            validate_email("catalog.students.email", &student.email)?;
        }

        validate_unique("catalog.plans.id", self.catalog.plans.iter().map(|p| p.id))?;
        for plan in &self.catalog.plans {
            validate_positive_number("catalog.plans.id", plan.id.0, 1)?;
            validate_non_empty_string("catalog.plans.title", &plan.title)?;
            validate_range("catalog.plans.duration", plan.duration, 1, MAX_PLAN_MONTHS)?;
            if plan.price < Decimal::ZERO {
                return Err(EnrollmentError::invalid_input(
                    "catalog.plans.price",
                    format!("Plan {} has a negative price", plan.id),
                ));
            }
        }

        Ok(())
    }

    pub fn data_dir(&self) -> &str {
        &self.store.data_dir
    }

    pub fn store_file_name(&self) -> &str {
        self.store.file_name.as_deref().unwrap_or("enrollments.json")
    }

    pub fn notifier_kind(&self) -> NotifierKind {
        match self.notifier.kind.as_deref() {
            Some("outbox") => NotifierKind::Outbox,
            _ => NotifierKind::Log,
        }
    }

    /// Relative to the data directory.
    pub fn outbox_dir(&self) -> &str {
        self.notifier.outbox_dir.as_deref().unwrap_or("outbox")
    }

    pub fn queue_capacity(&self) -> usize {
        self.notifier.queue_capacity.unwrap_or(64)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
