use chrono::{DateTime, Utc};
use helseplattform::workflows::notifications::{
    DeliveryOutcome, DeliveryReceipt, Notification, NotificationError, NotificationId,
    NotificationPreferences, NotificationQueue, NotificationStatus, NotificationTransport,
    OutboundMessage, QueuedDelivery, Recipient, TransportError,
};
use helseplattform::workflows::shifts::{
    ApplicationId, ApplicationStatus, AvailabilityRecord, Candidate, Contract, Department,
    DepartmentId, RepositoryError, Shift, ShiftApplication, ShiftId, ShiftRepository,
    ShiftStatus, WorkerDirectory, WorkerId, WorkerProfile, WorkerStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryShiftRepository {
    departments: Arc<Mutex<HashMap<DepartmentId, Department>>>,
    shifts: Arc<Mutex<HashMap<ShiftId, Shift>>>,
    applications: Arc<Mutex<HashMap<ApplicationId, ShiftApplication>>>,
    contracts: Arc<Mutex<Vec<Contract>>>,
}

impl InMemoryShiftRepository {
    pub(crate) fn register_department(&self, department: Department) {
        let mut guard = self.departments.lock().expect("repository mutex poisoned");
        guard.insert(department.id.clone(), department);
    }

    pub(crate) fn contracts(&self) -> Vec<Contract> {
        self.contracts
            .lock()
            .expect("repository mutex poisoned")
            .clone()
    }
}

impl ShiftRepository for InMemoryShiftRepository {
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
        // One application per worker and shift.
        if guard.values().any(|existing| {
            existing.shift_id == application.shift_id && existing.worker_id == application.worker_id
        }) {
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
        let mut guard = self.contracts.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.shift_id == contract.shift_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(contract.clone());
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryWorkerDirectory {
    workers: Arc<Mutex<HashMap<WorkerId, WorkerProfile>>>,
    availability: Arc<Mutex<Vec<AvailabilityRecord>>>,
}

impl InMemoryWorkerDirectory {
    pub(crate) fn register_worker(&self, worker: WorkerProfile) {
        let mut guard = self.workers.lock().expect("directory mutex poisoned");
        guard.insert(worker.id.clone(), worker);
    }
}

impl WorkerDirectory for InMemoryWorkerDirectory {
    fn available_candidates(
        &self,
        profession: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, RepositoryError> {
        let guard = self.workers.lock().expect("directory mutex poisoned");
        let mut candidates: Vec<&WorkerProfile> = guard
            .values()
            .filter(|worker| {
                worker.status == WorkerStatus::Available && worker.profession == profession
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.average_rating
                .unwrap_or(0.0)
                .total_cmp(&a.average_rating.unwrap_or(0.0))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(candidates
            .into_iter()
            .take(limit)
            .map(WorkerProfile::candidate)
            .collect())
    }

    fn fetch_worker(&self, id: &WorkerId) -> Result<Option<WorkerProfile>, RepositoryError> {
        let guard = self.workers.lock().expect("directory mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn insert_worker(&self, worker: WorkerProfile) -> Result<WorkerProfile, RepositoryError> {
        let mut guard = self.workers.lock().expect("directory mutex poisoned");
        if guard.contains_key(&worker.id)
            || guard
                .values()
                .any(|existing| existing.username == worker.username)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(worker.id.clone(), worker.clone());
        Ok(worker)
    }

    fn record_availability(
        &self,
        record: AvailabilityRecord,
    ) -> Result<AvailabilityRecord, RepositoryError> {
        let known = self
            .workers
            .lock()
            .expect("directory mutex poisoned")
            .contains_key(&record.worker_id);
        if !known {
            return Err(RepositoryError::NotFound);
        }
        self.availability
            .lock()
            .expect("directory mutex poisoned")
            .push(record.clone());
        Ok(record)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationQueue {
    rows: Arc<Mutex<Vec<Notification>>>,
    recipients: Arc<Mutex<HashMap<WorkerId, Recipient>>>,
}

impl InMemoryNotificationQueue {
    pub(crate) fn register_recipient(&self, worker: WorkerId, recipient: Recipient) {
        let mut guard = self.recipients.lock().expect("queue mutex poisoned");
        guard.insert(worker, recipient);
    }

    pub(crate) fn rows(&self) -> Vec<Notification> {
        self.rows.lock().expect("queue mutex poisoned").clone()
    }
}

impl NotificationQueue for InMemoryNotificationQueue {
    fn enqueue(&self, notification: Notification) -> Result<Notification, NotificationError> {
        self.rows
            .lock()
            .expect("queue mutex poisoned")
            .push(notification.clone());
        Ok(notification)
    }

    fn due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<QueuedDelivery>, NotificationError> {
        let rows = self.rows.lock().expect("queue mutex poisoned");
        let recipients = self.recipients.lock().expect("queue mutex poisoned");
        Ok(rows
            .iter()
            .filter(|row| row.status == NotificationStatus::Pending && row.scheduled_for <= now)
            .filter_map(|row| {
                recipients.get(&row.recipient).map(|recipient| QueuedDelivery {
                    notification: row.clone(),
                    recipient: recipient.clone(),
                })
            })
            .take(limit)
            .collect())
    }

    fn mark(&self, id: &NotificationId, outcome: DeliveryOutcome) -> Result<(), NotificationError> {
        let mut rows = self.rows.lock().expect("queue mutex poisoned");
        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or_else(|| NotificationError::NotFound(id.clone()))?;
        row.apply(outcome);
        Ok(())
    }
}

/// Transport that records deliveries in the log instead of calling a provider.
#[derive(Default)]
pub(crate) struct LoggingTransport {
    sequence: AtomicU64,
}

impl NotificationTransport for LoggingTransport {
    fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, TransportError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let provider_id = format!("log-{id:06}");
        match message {
            OutboundMessage::Email { to, subject, .. } => {
                info!(channel = "email", %to, %subject, %provider_id, "notification delivered")
            }
            OutboundMessage::Sms { to, .. } => {
                info!(channel = "sms", %to, %provider_id, "notification delivered")
            }
            OutboundMessage::Push { heading, .. } => {
                info!(channel = "push", %heading, %provider_id, "notification delivered")
            }
        }
        Ok(DeliveryReceipt {
            success: true,
            provider_id: Some(provider_id),
        })
    }
}

/// In-memory backends wired together, seeded with a small sample marketplace.
#[derive(Default, Clone)]
pub(crate) struct Marketplace {
    pub(crate) repository: Arc<InMemoryShiftRepository>,
    pub(crate) workers: Arc<InMemoryWorkerDirectory>,
    pub(crate) queue: Arc<InMemoryNotificationQueue>,
}

impl Marketplace {
    pub(crate) fn seeded() -> Self {
        let marketplace = Self::default();
        for department in sample_departments() {
            marketplace.repository.register_department(department);
        }
        for (worker, preferences) in sample_workers() {
            marketplace.queue.register_recipient(
                worker.id.clone(),
                Recipient {
                    full_name: worker.full_name.clone(),
                    email: worker.email.clone(),
                    preferences,
                },
            );
            marketplace.workers.register_worker(worker);
        }
        marketplace
    }
}

pub(crate) fn sample_departments() -> Vec<Department> {
    vec![
        Department {
            id: DepartmentId("dept-gran-sykehjem".to_string()),
            municipality_name: "Gran kommune".to_string(),
            department_name: "Gran sykehjem, avdeling 2".to_string(),
            cost_center_code: Some("4410".to_string()),
        },
        Department {
            id: DepartmentId("dept-lunner-hjemmetjeneste".to_string()),
            municipality_name: "Lunner kommune".to_string(),
            department_name: "Hjemmetjenesten".to_string(),
            cost_center_code: None,
        },
    ]
}

fn sample_workers() -> Vec<(WorkerProfile, NotificationPreferences)> {
    let worker = |id: &str,
                  name: &str,
                  profession: &str,
                  hourly_rate: u32,
                  average_rating: Option<f64>,
                  total_reviews: u32| WorkerProfile {
        id: WorkerId(id.to_string()),
        full_name: name.to_string(),
        username: id.trim_start_matches("worker-").to_string(),
        email: format!("{}@example.no", id.trim_start_matches("worker-")),
        profession: profession.to_string(),
        hourly_rate,
        average_rating,
        total_reviews,
        status: WorkerStatus::Available,
        hpr_number: None,
        personal_number: None,
    };

    vec![
        (
            worker("worker-anne", "Anne Berg", "Sykepleier", 450, Some(4.8), 32),
            NotificationPreferences {
                phone_number: Some("+4791234567".to_string()),
                push_token: Some("push-anne".to_string()),
                ..NotificationPreferences::default()
            },
        ),
        (
            worker("worker-bjorn", "Bjørn Dahl", "Sykepleier", 500, Some(4.6), 25),
            NotificationPreferences {
                sms_enabled: false,
                ..NotificationPreferences::default()
            },
        ),
        (
            worker("worker-cato", "Cato Lie", "Sykepleier", 440, Some(3.2), 3),
            NotificationPreferences {
                phone_number: Some("+4798765432".to_string()),
                ..NotificationPreferences::default()
            },
        ),
        (
            worker("worker-dina", "Dina Holm", "Sykepleier", 620, None, 0),
            NotificationPreferences::default(),
        ),
        (
            worker("worker-eirik", "Eirik Moen", "Helsefagarbeider", 360, Some(4.1), 12),
            NotificationPreferences::default(),
        ),
    ]
}
