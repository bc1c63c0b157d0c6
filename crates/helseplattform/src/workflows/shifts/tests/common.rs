use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::notifications::{
    DeliveryOutcome, Notification, NotificationError, NotificationId, NotificationQueue,
    QueuedDelivery,
};
use crate::workflows::shifts::domain::{
    ApplicationId, ApplicationStatus, AvailabilityRecord, Contract, Department, DepartmentId,
    Shift, ShiftApplication, ShiftDraft, ShiftId, ShiftStatus, WorkerId, WorkerProfile,
    WorkerStatus,
};
use crate::workflows::shifts::matching::{Candidate, MatchingConfig};
use crate::workflows::shifts::repository::{RepositoryError, ShiftRepository, WorkerDirectory};
use crate::workflows::shifts::service::ShiftMarketplaceService;

pub(super) type TestService = ShiftMarketplaceService<MemoryShiftRepository, MemoryDirectory, MemoryQueue>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 10, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn department() -> Department {
    Department {
        id: DepartmentId("dept-gran".to_string()),
        municipality_name: "Gran kommune".to_string(),
        department_name: "Sykehjemmet avd. 2".to_string(),
        cost_center_code: Some("4410".to_string()),
    }
}

pub(super) fn other_department() -> Department {
    Department {
        id: DepartmentId("dept-lunner".to_string()),
        municipality_name: "Lunner kommune".to_string(),
        department_name: "Hjemmetjenesten".to_string(),
        cost_center_code: None,
    }
}

pub(super) fn worker(
    id: &str,
    hourly_rate: u32,
    average_rating: Option<f64>,
    total_reviews: u32,
) -> WorkerProfile {
    WorkerProfile {
        id: WorkerId(id.to_string()),
        full_name: format!("Worker {id}"),
        username: id.to_string(),
        email: format!("{id}@example.no"),
        profession: "Sykepleier".to_string(),
        hourly_rate,
        average_rating,
        total_reviews,
        status: WorkerStatus::Available,
        hpr_number: None,
        personal_number: None,
    }
}

pub(super) fn candidate(
    id: &str,
    hourly_rate: u32,
    average_rating: Option<f64>,
    total_reviews: u32,
) -> Candidate {
    worker(id, hourly_rate, average_rating, total_reviews).candidate()
}

pub(super) fn draft(profession: &str, hourly_wage: u32, starts_in_days: i64) -> ShiftDraft {
    let start_time = now() + Duration::days(starts_in_days);
    ShiftDraft {
        start_time,
        end_time: start_time + Duration::hours(8),
        profession: profession.to_string(),
        hourly_wage,
        description: "Dagvakt på skjermet enhet".to_string(),
    }
}

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryShiftRepository>,
    Arc<MemoryDirectory>,
    Arc<MemoryQueue>,
) {
    let repository = Arc::new(MemoryShiftRepository::with_departments(vec![
        department(),
        other_department(),
    ]));
    let directory = Arc::new(MemoryDirectory::with_workers(vec![
        worker("w-anne", 450, Some(4.6), 25),
        worker("w-bjorn", 500, Some(4.6), 25),
        worker("w-cato", 440, Some(3.2), 3),
    ]));
    let queue = Arc::new(MemoryQueue::default());
    let service = ShiftMarketplaceService::new(
        repository.clone(),
        directory.clone(),
        queue.clone(),
        MatchingConfig::default(),
    );
    (service, repository, directory, queue)
}

#[derive(Default)]
pub(super) struct MemoryShiftRepository {
    departments: Mutex<HashMap<DepartmentId, Department>>,
    shifts: Mutex<HashMap<ShiftId, Shift>>,
    applications: Mutex<HashMap<ApplicationId, ShiftApplication>>,
    contracts: Mutex<Vec<Contract>>,
}

impl MemoryShiftRepository {
    pub(super) fn with_departments(departments: Vec<Department>) -> Self {
        let repository = Self::default();
        {
            let mut guard = repository
                .departments
                .lock()
                .expect("repository mutex poisoned");
            for department in departments {
                guard.insert(department.id.clone(), department);
            }
        }
        repository
    }

    pub(super) fn contracts(&self) -> Vec<Contract> {
        self.contracts
            .lock()
            .expect("repository mutex poisoned")
            .clone()
    }
}

impl ShiftRepository for MemoryShiftRepository {
    fn department(&self, id: &DepartmentId) -> Result<Option<Department>, RepositoryError> {
        let guard = self.departments.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert_department(&self, department: Department) -> Result<Department, RepositoryError> {
        let mut guard = self.departments.lock().expect("repository mutex poisoned");
        if guard.contains_key(&department.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(department.id.clone(), department.clone());
        Ok(department)
    }

    fn insert_shift(&self, shift: Shift) -> Result<Shift, RepositoryError> {
        let mut guard = self.shifts.lock().expect("repository mutex poisoned");
        if guard.contains_key(&shift.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(shift.id.clone(), shift.clone());
        Ok(shift)
    }

    fn fetch_shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        let guard = self.shifts.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_shift_status(
        &self,
        id: &ShiftId,
        status: ShiftStatus,
    ) -> Result<Shift, RepositoryError> {
        let mut guard = self.shifts.lock().expect("repository mutex poisoned");
        let shift = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        shift.status = status;
        Ok(shift.clone())
    }

    fn shifts_with_status(&self, status: ShiftStatus) -> Result<Vec<Shift>, RepositoryError> {
        let guard = self.shifts.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|shift| shift.status == status)
            .cloned()
            .collect())
    }

    fn department_shifts(&self, id: &DepartmentId) -> Result<Vec<Shift>, RepositoryError> {
        let guard = self.shifts.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|shift| &shift.department.id == id)
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        application: ShiftApplication,
    ) -> Result<ShiftApplication, RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        let duplicate = guard.values().any(|existing| {
            existing.shift_id == application.shift_id && existing.worker_id == application.worker_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ShiftApplication>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ShiftApplication, RepositoryError> {
        let mut guard = self.applications.lock().expect("repository mutex poisoned");
        let application = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        application.status = status;
        Ok(application.clone())
    }

    fn shift_applications(&self, id: &ShiftId) -> Result<Vec<ShiftApplication>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| &application.shift_id == id)
            .cloned()
            .collect())
    }

    fn worker_applications(
        &self,
        id: &WorkerId,
    ) -> Result<Vec<ShiftApplication>, RepositoryError> {
        let guard = self.applications.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|application| &application.worker_id == id)
            .cloned()
            .collect())
    }

    fn insert_contract(&self, contract: Contract) -> Result<Contract, RepositoryError> {
        self.contracts
            .lock()
            .expect("repository mutex poisoned")
            .push(contract.clone());
        Ok(contract)
    }

    fn shift_contracts(&self, id: &ShiftId) -> Result<Vec<Contract>, RepositoryError> {
        let guard = self.contracts.lock().expect("repository mutex poisoned");
        Ok(guard
            .iter()
            .filter(|contract| &contract.shift_id == id)
            .cloned()
            .collect())
    }
}

/// Repository whose contract table is offline; everything else delegates.
#[derive(Default)]
pub(super) struct ContractOfflineRepository {
    pub(super) inner: MemoryShiftRepository,
}

impl ShiftRepository for ContractOfflineRepository {
    fn department(&self, id: &DepartmentId) -> Result<Option<Department>, RepositoryError> {
        self.inner.department(id)
    }

    fn insert_department(&self, department: Department) -> Result<Department, RepositoryError> {
        self.inner.insert_department(department)
    }

    fn insert_shift(&self, shift: Shift) -> Result<Shift, RepositoryError> {
        self.inner.insert_shift(shift)
    }

    fn fetch_shift(&self, id: &ShiftId) -> Result<Option<Shift>, RepositoryError> {
        self.inner.fetch_shift(id)
    }

    fn update_shift_status(
        &self,
        id: &ShiftId,
        status: ShiftStatus,
    ) -> Result<Shift, RepositoryError> {
        self.inner.update_shift_status(id, status)
    }

    fn shifts_with_status(&self, status: ShiftStatus) -> Result<Vec<Shift>, RepositoryError> {
        self.inner.shifts_with_status(status)
    }

    fn department_shifts(&self, id: &DepartmentId) -> Result<Vec<Shift>, RepositoryError> {
        self.inner.department_shifts(id)
    }

    fn insert_application(
        &self,
        application: ShiftApplication,
    ) -> Result<ShiftApplication, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<ShiftApplication>, RepositoryError> {
        self.inner.fetch_application(id)
    }

    fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<ShiftApplication, RepositoryError> {
        self.inner.update_application_status(id, status)
    }

    fn shift_applications(&self, id: &ShiftId) -> Result<Vec<ShiftApplication>, RepositoryError> {
        self.inner.shift_applications(id)
    }

    fn worker_applications(
        &self,
        id: &WorkerId,
    ) -> Result<Vec<ShiftApplication>, RepositoryError> {
        self.inner.worker_applications(id)
    }

    fn insert_contract(&self, _contract: Contract) -> Result<Contract, RepositoryError> {
        Err(RepositoryError::Unavailable("contracts offline".to_string()))
    }

    fn shift_contracts(&self, id: &ShiftId) -> Result<Vec<Contract>, RepositoryError> {
        self.inner.shift_contracts(id)
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    workers: Mutex<Vec<WorkerProfile>>,
    availability: Mutex<Vec<AvailabilityRecord>>,
}

impl MemoryDirectory {
    pub(super) fn with_workers(workers: Vec<WorkerProfile>) -> Self {
        Self {
            workers: Mutex::new(workers),
            availability: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn availability(&self) -> Vec<AvailabilityRecord> {
        self.availability
            .lock()
            .expect("directory mutex poisoned")
            .clone()
    }
}

impl WorkerDirectory for MemoryDirectory {
    fn available_candidates(
        &self,
        profession: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.workers.lock().expect("directory mutex poisoned");
        let mut matching: Vec<&WorkerProfile> = guard
            .iter()
            .filter(|worker| {
                worker.status == WorkerStatus::Available && worker.profession == profession
            })
            .collect();
        matching.sort_by(|a, b| {
            b.average_rating
                .unwrap_or(0.0)
                .total_cmp(&a.average_rating.unwrap_or(0.0))
        });
        Ok(matching
            .into_iter()
            .take(limit)
            .map(WorkerProfile::candidate)
            .collect())
    }

    fn fetch_worker(&self, id: &WorkerId) -> Result<Option<WorkerProfile>, RepositoryError> {
        let guard = self.workers.lock().expect("directory mutex poisoned");
        Ok(guard.iter().find(|worker| &worker.id == id).cloned())
    }

    fn insert_worker(&self, worker: WorkerProfile) -> Result<WorkerProfile, RepositoryError> {
        let mut guard = self.workers.lock().expect("directory mutex poisoned");
        if guard
            .iter()
            .any(|existing| existing.id == worker.id || existing.username == worker.username)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.push(worker.clone());
        Ok(worker)
    }

    fn record_availability(
        &self,
        record: AvailabilityRecord,
    ) -> Result<AvailabilityRecord, RepositoryError> {
        self.availability
            .lock()
            .expect("directory mutex poisoned")
            .push(record.clone());
        Ok(record)
    }
}

pub(super) struct UnavailableDirectory;

impl WorkerDirectory for UnavailableDirectory {
    fn available_candidates(
        &self,
        _profession: &str,
        _limit: usize,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }

    fn fetch_worker(&self, _id: &WorkerId) -> Result<Option<WorkerProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }

    fn insert_worker(&self, _worker: WorkerProfile) -> Result<WorkerProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }

    fn record_availability(
        &self,
        _record: AvailabilityRecord,
    ) -> Result<AvailabilityRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("directory offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryQueue {
    rows: Mutex<Vec<Notification>>,
}

impl MemoryQueue {
    pub(super) fn rows(&self) -> Vec<Notification> {
        self.rows.lock().expect("queue mutex poisoned").clone()
    }
}

impl NotificationQueue for MemoryQueue {
    fn enqueue(&self, notification: Notification) -> Result<Notification, NotificationError> {
        self.rows
            .lock()
            .expect("queue mutex poisoned")
            .push(notification.clone());
        Ok(notification)
    }

    fn due(
        &self,
        _now: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<QueuedDelivery>, NotificationError> {
        Ok(Vec::new())
    }

    fn mark(&self, id: &NotificationId, _outcome: DeliveryOutcome) -> Result<(), NotificationError> {
        Err(NotificationError::NotFound(id.clone()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
