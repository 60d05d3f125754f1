use crate::domain::model::{
    Enrollment, EnrollmentListing, EnrollmentRecord, EnrollmentRequest, Plan, Student, StudentId,
};
use crate::domain::ports::{Clock, EnrollmentRepository, Notifier};
use crate::domain::rules::derive_enrollment;
use crate::utils::error::{EnrollmentError, Result};
use crate::utils::validation::Validate;
use std::sync::Arc;

/// Runs the enrollment rules against a repository and a notifier.
///
/// Holds no state of its own; everything lives behind the injected ports.
pub struct EnrollmentService<R, N, C> {
    repository: Arc<R>,
    notifier: Arc<N>,
    clock: Arc<C>,
}

impl<R, N, C> EnrollmentService<R, N, C>
where
    R: EnrollmentRepository,
    N: Notifier,
    C: Clock,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            repository,
            notifier,
            clock,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Stores a new enrollment and sends the confirmation.
    ///
    /// A failed confirmation is logged; the stored enrollment is still
    /// returned.
    pub async fn create(&self, request: &EnrollmentRequest) -> Result<Enrollment> {
        request.validate()?;

        if self
            .repository
            .find_enrollment_by_student(request.student_id)
            .await?
            .is_some()
        {
            tracing::warn!("Student {} is already enrolled", request.student_id);
            return Err(EnrollmentError::AlreadyEnrolled {
                student_id: request.student_id,
            });
        }

        let (student, plan) = self.resolve(request).await?;
        let terms = derive_enrollment(&request.start_date, &plan, self.clock.now())?;

        let enrollment = self
            .repository
            .create_enrollment(EnrollmentRecord::new(student.id, plan.id, terms))
            .await?;
        tracing::info!(
            "✅ Enrollment {} created: student {} on plan {} until {}",
            enrollment.id,
            student.id,
            plan.id,
            enrollment.end_date
        );

        if let Err(e) = self
            .notifier
            .notify_enrollment_created(&student, &plan, &enrollment)
            .await
        {
            tracing::error!(
                "❌ Confirmation for enrollment {} not sent: {}",
                enrollment.id,
                e
            );
        }

        Ok(enrollment)
    }

    /// Moves an existing enrollment to a new plan and/or start date. The id
    /// is kept and no confirmation is sent.
    pub async fn update(&self, request: &EnrollmentRequest) -> Result<Enrollment> {
        request.validate()?;

        let existing = self
            .repository
            .find_enrollment_by_student(request.student_id)
            .await?
            .ok_or(EnrollmentError::NotEnrolled {
                student_id: request.student_id,
            })?;

        let (student, plan) = self.resolve(request).await?;
        let terms = derive_enrollment(&request.start_date, &plan, self.clock.now())?;

        let enrollment = self
            .repository
            .update_enrollment(existing.id, EnrollmentRecord::new(student.id, plan.id, terms))
            .await?;
        tracing::info!(
            "✅ Enrollment {} updated: plan {} -> {}",
            enrollment.id,
            existing.plan_id,
            enrollment.plan_id
        );

        Ok(enrollment)
    }

    pub async fn delete(&self, student_id: StudentId) -> Result<Enrollment> {
        let not_enrolled = || EnrollmentError::NotEnrolled { student_id };

        let existing = self
            .repository
            .find_enrollment_by_student(student_id)
            .await?
            .ok_or_else(not_enrolled)?;

        let removed = self
            .repository
            .delete_enrollment(existing.id)
            .await?
            .ok_or_else(not_enrolled)?;
        tracing::info!("🗑️ Enrollment {} of student {} deleted", removed.id, student_id);

        Ok(removed)
    }

    pub async fn list(&self) -> Result<Vec<EnrollmentListing>> {
        let listings = self.repository.list_enrollments().await?;
        tracing::debug!("Listing {} enrollments", listings.len());
        Ok(listings)
    }

    async fn resolve(&self, request: &EnrollmentRequest) -> Result<(Student, Plan)> {
        let student = self
            .repository
            .find_student(request.student_id)
            .await?
            .ok_or(EnrollmentError::StudentNotFound {
                student_id: request.student_id,
            })?;

        let plan = self
            .repository
            .find_plan(request.plan_id)
            .await?
            .ok_or(EnrollmentError::PlanNotFound {
                plan_id: request.plan_id,
            })?;

        Ok((student, plan))
    }
}
