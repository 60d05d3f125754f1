use crate::domain::model::{Enrollment, EnrollmentId, Plan, Student};
use crate::domain::ports::{Notifier, Storage};
use crate::utils::error::{EnrollmentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// The confirmation sent to a student once an enrollment is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationMessage {
    pub enrollment_id: EnrollmentId,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl ConfirmationMessage {
    pub fn compose(student: &Student, plan: &Plan, enrollment: &Enrollment) -> Self {
        let body = format!(
            "Hello {name},\n\n\
             Your enrollment in the {title} plan is confirmed.\n\n\
             Start: {start}\n\
             End: {end}\n\
             Monthly price: {monthly}\n\
             Duration: {duration} month(s)\n\
             Total: {total}\n",
            name = student.name,
            title = plan.title,
            start = format_date(enrollment.start_date),
            end = format_date(enrollment.end_date),
            monthly = plan.price.round_dp(2),
            duration = plan.duration,
            total = enrollment.price.round_dp(2),
        );

        Self {
            enrollment_id: enrollment.id,
            to: format!("{} <{}>", student.name, student.email),
            subject: format!("Enrollment confirmed: {}", plan.title),
            body,
        }
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Writes confirmations to the log instead of sending them anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_enrollment_created(
        &self,
        student: &Student,
        plan: &Plan,
        enrollment: &Enrollment,
    ) -> Result<()> {
        let message = ConfirmationMessage::compose(student, plan, enrollment);
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "📧 Confirmation for enrollment {}",
            message.enrollment_id
        );
        tracing::debug!("{}", message.body);
        Ok(())
    }
}

/// Drops each confirmation as a JSON file into an outbox directory for an
/// external mailer to pick up.
#[derive(Debug, Clone)]
pub struct OutboxNotifier<S: Storage> {
    storage: S,
    outbox_dir: String,
}

impl<S: Storage> OutboxNotifier<S> {
    pub fn new(storage: S, outbox_dir: impl Into<String>) -> Self {
        Self {
            storage,
            outbox_dir: outbox_dir.into(),
        }
    }

    pub fn message_path(&self, enrollment_id: EnrollmentId) -> String {
        format!(
            "{}/enrollment-{}.json",
            self.outbox_dir.trim_end_matches('/'),
            enrollment_id
        )
    }
}

#[async_trait]
impl<S: Storage> Notifier for OutboxNotifier<S> {
    async fn notify_enrollment_created(
        &self,
        student: &Student,
        plan: &Plan,
        enrollment: &Enrollment,
    ) -> Result<()> {
        let message = ConfirmationMessage::compose(student, plan, enrollment);
        let path = self.message_path(message.enrollment_id);
        let bytes = serde_json::to_vec_pretty(&message)?;

        self.storage
            .write_file(&path, &bytes)
            .await
            .map_err(|e| EnrollmentError::NotificationError {
                message: format!("could not write {}: {}", path, e),
            })?;

        tracing::info!("📧 Queued confirmation at {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStorage;
    use crate::domain::model::{PlanId, StudentId};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn fixtures() -> (Student, Plan, Enrollment) {
        let student = Student {
            id: StudentId(3),
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
        };
        let plan = Plan {
            id: PlanId(2),
            title: "Quarterly".to_string(),
            price: Decimal::new(12990, 2),
            duration: 3,
        };
        let enrollment = Enrollment {
            id: EnrollmentId(11),
            student_id: student.id,
            plan_id: plan.id,
            start_date: Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).unwrap(),
            price: Decimal::new(38970, 2),
        };
        (student, plan, enrollment)
    }

    #[test]
    fn test_compose_confirmation() {
        let (student, plan, enrollment) = fixtures();
        let message = ConfirmationMessage::compose(&student, &plan, &enrollment);

        assert_eq!(message.to, "Grace Hopper <grace@example.com>");
        assert_eq!(message.subject, "Enrollment confirmed: Quarterly");
        assert!(message.body.contains("Start: 2024-01-10 09:00 UTC"));
        assert!(message.body.contains("End: 2024-04-10 09:00 UTC"));
        assert!(message.body.contains("Total: 389.70"));
    }

    #[tokio::test]
    async fn test_outbox_writes_one_file_per_enrollment() {
        let (student, plan, enrollment) = fixtures();
        let storage = MemoryStorage::new();
        let notifier = OutboxNotifier::new(storage.clone(), "outbox/");

        notifier
            .notify_enrollment_created(&student, &plan, &enrollment)
            .await
            .unwrap();

        let bytes = storage.read_file("outbox/enrollment-11.json").await.unwrap();
        let message: ConfirmationMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(message.enrollment_id, EnrollmentId(11));
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let (student, plan, enrollment) = fixtures();
        assert!(LogNotifier
            .notify_enrollment_created(&student, &plan, &enrollment)
            .await
            .is_ok());
    }
}
