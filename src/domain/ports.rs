use crate::domain::model::{
    Enrollment, EnrollmentId, EnrollmentListing, EnrollmentRecord, Plan, PlanId, Student,
    StudentId,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Raw byte storage addressed by relative path.
///
/// A missing file is reported as `EnrollmentError::IoError` with
/// `std::io::ErrorKind::NotFound`.
pub trait Storage: Send + Sync {
    /// Guard returned by [`Storage::lock`]; the lock is released on drop.
    type Lock: Send;

    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Waits for the exclusive lock named by `path`. Holders of the same
    /// name on the same backing store exclude each other, across processes
    /// where the backend is shared between them.
    fn lock(&self, path: &str) -> impl std::future::Future<Output = Result<Self::Lock>> + Send;
}

/// Persistence for students, plans and enrollments.
///
/// `create_enrollment` must reject a second enrollment for the same student
/// with `EnrollmentError::AlreadyEnrolled`, atomically with the insert.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_student(&self, id: StudentId) -> Result<Option<Student>>;

    async fn find_plan(&self, id: PlanId) -> Result<Option<Plan>>;

    async fn find_enrollment_by_student(&self, id: StudentId) -> Result<Option<Enrollment>>;

    async fn create_enrollment(&self, record: EnrollmentRecord) -> Result<Enrollment>;

    /// Fails with `NotEnrolled` if `id` no longer exists.
    async fn update_enrollment(&self, id: EnrollmentId, record: EnrollmentRecord)
        -> Result<Enrollment>;

    /// Returns the removed record, or `None` if `id` was already gone.
    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>>;

    /// Every enrollment joined with its student and plan, ordered by id.
    async fn list_enrollments(&self) -> Result<Vec<EnrollmentListing>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_enrollment_created(
        &self,
        student: &Student,
        plan: &Plan,
        enrollment: &Enrollment,
    ) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
