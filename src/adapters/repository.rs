//! Repository kept as a single JSON document behind a [`Storage`] backend.
//!
//! Every mutation takes the storage lock named `<path>.lock`, re-reads the
//! document, applies the change and writes it back before releasing the
//! lock. Handles in other tasks or processes sharing the same backend
//! therefore see each other's writes, and the "already enrolled" check and
//! the insert are atomic across all of them. A failed change or write leaves
//! the stored document unchanged.

use crate::domain::model::{
    Enrollment, EnrollmentId, EnrollmentListing, EnrollmentRecord, Plan, PlanId, Student,
    StudentId,
};
use crate::domain::ports::{EnrollmentRepository, Storage};
use crate::utils::error::{EnrollmentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    students: Vec<Student>,
    #[serde(default)]
    plans: Vec<Plan>,
    #[serde(default)]
    enrollments: Vec<Enrollment>,
    #[serde(default)]
    last_enrollment_id: u64,
}

impl Document {
    fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    fn plan(&self, id: PlanId) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == id)
    }

    fn enrollment_of(&self, student_id: StudentId) -> Option<&Enrollment> {
        self.enrollments.iter().find(|e| e.student_id == student_id)
    }
}

pub struct DocumentRepository<S: Storage> {
    storage: S,
    path: String,
    lock_path: String,
}

impl<S: Storage> DocumentRepository<S> {
    /// Opens the store at `path`; a missing file starts an empty store.
    /// An unreadable document fails here rather than on first use.
    pub async fn open(storage: S, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let repository = Self {
            lock_path: format!("{}.lock", path),
            storage,
            path,
        };
        repository.load().await?;
        Ok(repository)
    }

    /// Inserts or replaces catalog entries by id.
    pub async fn upsert_catalog(&self, students: &[Student], plans: &[Plan]) -> Result<()> {
        let (student_count, plan_count) = self
            .mutate(|document| {
                for student in students {
                    match document.students.iter_mut().find(|s| s.id == student.id) {
                        Some(existing) => *existing = student.clone(),
                        None => document.students.push(student.clone()),
                    }
                }
                for plan in plans {
                    match document.plans.iter_mut().find(|p| p.id == plan.id) {
                        Some(existing) => *existing = plan.clone(),
                        None => document.plans.push(plan.clone()),
                    }
                }
                document.students.sort_by_key(|s| s.id);
                document.plans.sort_by_key(|p| p.id);
                Ok((document.students.len(), document.plans.len()))
            })
            .await?;

        tracing::debug!(
            "Catalog holds {} students and {} plans",
            student_count,
            plan_count
        );
        Ok(())
    }

    pub async fn students(&self) -> Result<Vec<Student>> {
        Ok(self.load().await?.students)
    }

    pub async fn plans(&self) -> Result<Vec<Plan>> {
        Ok(self.load().await?.plans)
    }

    async fn load(&self) -> Result<Document> {
        match self.storage.read_file(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(EnrollmentError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No store at {}, starting empty", self.path);
                Ok(Document::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Runs `change` against the current document under the storage lock and
    /// persists the result. Nothing is written when `change` fails.
    async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Document) -> Result<T> + Send,
    {
        let _lock = self.storage.lock(&self.lock_path).await?;
        let mut document = self.load().await?;
        let outcome = change(&mut document)?;
        self.persist(&document).await?;
        Ok(outcome)
    }

    async fn persist(&self, document: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document)?;
        self.storage.write_file(&self.path, &bytes).await
    }
}

#[async_trait]
impl<S: Storage> EnrollmentRepository for DocumentRepository<S> {
    async fn find_student(&self, id: StudentId) -> Result<Option<Student>> {
        Ok(self.load().await?.student(id).cloned())
    }

    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>> {
        Ok(self.load().await?.plan(id).cloned())
    }

    async fn find_enrollment_by_student(&self, id: StudentId) -> Result<Option<Enrollment>> {
        Ok(self.load().await?.enrollment_of(id).cloned())
    }

    async fn create_enrollment(&self, record: EnrollmentRecord) -> Result<Enrollment> {
        self.mutate(|document| {
            if document.enrollment_of(record.student_id).is_some() {
                return Err(EnrollmentError::AlreadyEnrolled {
                    student_id: record.student_id,
                });
            }

            document.last_enrollment_id += 1;
            let enrollment = record.into_enrollment(EnrollmentId(document.last_enrollment_id));
            document.enrollments.push(enrollment.clone());
            Ok(enrollment)
        })
        .await
    }

    async fn update_enrollment(
        &self,
        id: EnrollmentId,
        record: EnrollmentRecord,
    ) -> Result<Enrollment> {
        self.mutate(|document| {
            let slot = document
                .enrollments
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or(EnrollmentError::NotEnrolled {
                    student_id: record.student_id,
                })?;
            *slot = record.into_enrollment(id);
            Ok(slot.clone())
        })
        .await
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>> {
        self.mutate(|document| {
            Ok(document
                .enrollments
                .iter()
                .position(|e| e.id == id)
                .map(|position| document.enrollments.remove(position)))
        })
        .await
    }

    async fn list_enrollments(&self) -> Result<Vec<EnrollmentListing>> {
        let document = self.load().await?;
        let mut listings = Vec::with_capacity(document.enrollments.len());

        for enrollment in &document.enrollments {
            let (Some(student), Some(plan)) = (
                document.student(enrollment.student_id),
                document.plan(enrollment.plan_id),
            ) else {
                tracing::warn!(
                    "Enrollment {} points at a missing student or plan, skipping",
                    enrollment.id
                );
                continue;
            };

            listings.push(EnrollmentListing {
                id: enrollment.id,
                start_date: enrollment.start_date,
                end_date: enrollment.end_date,
                price: enrollment.price,
                student: student.into(),
                plan: plan.into(),
            });
        }

        listings.sort_by_key(|l| l.id);
        Ok(listings)
    }
}
