//! Background delivery of confirmations.
//!
//! [`QueuedNotifier`] hands notices to a worker task and returns at once, so
//! a slow or failing notifier never holds up the request that stored the
//! enrollment. The worker stops once every sender is dropped and reports
//! what it delivered.

use crate::domain::model::{Enrollment, Plan, Student};
use crate::domain::ports::Notifier;
use crate::utils::error::{EnrollmentError, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct EnrollmentNotice {
    student: Student,
    plan: Plan,
    enrollment: Enrollment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    sender: mpsc::Sender<EnrollmentNotice>,
}

impl QueuedNotifier {
    pub fn spawn<N>(inner: N, capacity: usize) -> (Self, JoinHandle<DeliveryStats>)
    where
        N: Notifier + 'static,
    {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(deliver(inner, receiver));
        (Self { sender }, worker)
    }
}

async fn deliver<N: Notifier>(
    inner: N,
    mut receiver: mpsc::Receiver<EnrollmentNotice>,
) -> DeliveryStats {
    let mut stats = DeliveryStats::default();

    while let Some(notice) = receiver.recv().await {
        match inner
            .notify_enrollment_created(&notice.student, &notice.plan, &notice.enrollment)
            .await
        {
            Ok(()) => stats.delivered += 1,
            Err(e) => {
                stats.failed += 1;
                tracing::error!(
                    "❌ Confirmation for enrollment {} failed: {}",
                    notice.enrollment.id,
                    e
                );
            }
        }
    }

    tracing::debug!(
        "Notification worker stopped: {} delivered, {} failed",
        stats.delivered,
        stats.failed
    );
    stats
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn notify_enrollment_created(
        &self,
        student: &Student,
        plan: &Plan,
        enrollment: &Enrollment,
    ) -> Result<()> {
        let notice = EnrollmentNotice {
            student: student.clone(),
            plan: plan.clone(),
            enrollment: enrollment.clone(),
        };

        self.sender
            .try_send(notice)
            .map_err(|e| EnrollmentError::NotificationError {
                message: match e {
                    mpsc::error::TrySendError::Full(_) => "notification queue is full".to_string(),
                    mpsc::error::TrySendError::Closed(_) => {
                        "notification worker has stopped".to_string()
                    }
                },
            })
    }
}
