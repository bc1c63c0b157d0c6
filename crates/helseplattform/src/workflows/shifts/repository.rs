use super::domain::{
    ApplicationId, ApplicationStatus, AvailabilityRecord, Contract, Department, DepartmentId,
    Shift, ShiftApplication, ShiftId, ShiftStatus, WorkerId, WorkerProfile,
};
use super::matching::Candidate;

/// Storage abstraction over departments, shifts, applications, and contracts.
pub trait ShiftRepository: Send + Sync {
    fn department(&self, id: &DepartmentId) -> Result<Option<Department>, RepositoryError>;
    fn insert_department(&self, department: Department) -> Result<Department, RepositoryError>;

    fn insert_shift(&self, shift: Shift) -> Result<Shift, RepositoryError>;
    fn fetch_shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError>;
    fn update_shift_status(
        &self,
        id: &ShiftId,
        status: ShiftStatus,
    ) -> Result<Shift, RepositoryError>;
    fn shifts_with_status(&self, status: ShiftStatus) -> Result<Vec<Shift>, RepositoryError>;
    fn department_shifts(&self, id: &DepartmentId) -> Result<Vec<Shift>, RepositoryError>;

    fn insert_application(
        &self,
        application: ShiftApplication,
    ) -> Result<ShiftApplication, RepositoryError>;
    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ShiftApplication>, RepositoryError>;
    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ShiftApplication, RepositoryError>;
    fn shift_applications(&self, id: &ShiftId) -> Result<Vec<ShiftApplication>, RepositoryError>;
    fn worker_applications(
        &self,
        id: &WorkerId,
    ) -> Result<Vec<ShiftApplication>, RepositoryError>;

    fn insert_contract(&self, contract: Contract) -> Result<Contract, RepositoryError>;
    fn shift_contracts(&self, id: &ShiftId) -> Result<Vec<Contract>, RepositoryError>;
}

/// Candidate source: worker profiles and their posted availability.
pub trait WorkerDirectory: Send + Sync {
    /// Available workers of `profession`, best rated first, at most `limit` entries.
    fn available_candidates(
        &self,
        profession: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RepositoryError>;
    fn fetch_worker(&self, id: &WorkerId) -> Result<Option<WorkerProfile>, RepositoryError>;
    /// Store a new profile; usernames are unique.
    fn insert_worker(&self, worker: WorkerProfile) -> Result<WorkerProfile, RepositoryError>;
    fn record_availability(
        &self,
        record: AvailabilityRecord,
    ) -> Result<AvailabilityRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
