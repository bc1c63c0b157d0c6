use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    ApplicationId, ApplicationStatus, AvailabilityPosting, AvailabilityRecord, Contract,
    ContractId, ContractStatus, Department, DepartmentId, DepartmentRegistration,
    RegisteredWorker, Shift, ShiftApplication, ShiftDraft, ShiftFilter, ShiftId, ShiftStatus,
    StaffedShift, WorkerId, WorkerRegistration,
};
use super::matching::{MatchScorer, MatchingConfig, RankedCandidate};
use super::repository::{RepositoryError, ShiftRepository, WorkerDirectory};
use super::validation::{IntakeGuard, ValidationError};
use crate::identity::{SessionContext, SessionRole};
use crate::workflows::notifications::{
    ChannelSelection, Notification, NotificationError, NotificationId, NotificationQueue,
};

/// Service composing the repositories, intake guard, match scorer, and notification queue.
pub struct ShiftMarketplaceService<R, W, Q> {
    guard: IntakeGuard,
    repository: Arc<R>,
    workers: Arc<W>,
    notifications: Arc<Q>,
    scorer: Arc<MatchScorer>,
}

static SHIFT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CONTRACT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static WORKER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static DEPARTMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

const COMPLETED_SHIFT_LIMIT: usize = 50;

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

/// Result of approving an application: the three rows written, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalOutcome {
    pub application: ShiftApplication,
    pub contract: Contract,
    pub shift: Shift,
}

/// Counts reported after queueing shift notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationBatch {
    pub candidates: usize,
    pub queued: usize,
}

impl<R, W, Q> ShiftMarketplaceService<R, W, Q>
where
    R: ShiftRepository + 'static,
    W: WorkerDirectory + 'static,
    Q: NotificationQueue + 'static,
{
    pub fn new(
        repository: Arc<R>,
        workers: Arc<W>,
        notifications: Arc<Q>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            guard: IntakeGuard,
            repository,
            workers,
            notifications,
            scorer: Arc::new(MatchScorer::new(config)),
        }
    }

    pub fn matching_config(&self) -> &MatchingConfig {
        self.scorer.config()
    }

    /// Publish a shift on behalf of the signed-in department.
    pub fn create_shift(
        &self,
        session: &SessionContext,
        draft: ShiftDraft,
    ) -> Result<Shift, MarketplaceError> {
        let department_id = session.department_id().ok_or(MarketplaceError::Forbidden {
            required: SessionRole::Department,
        })?;
        let department = self
            .repository
            .department(&department_id)?
            .ok_or(RepositoryError::NotFound)?;

        let id = ShiftId(next_id(&SHIFT_SEQUENCE, "shift"));
        let shift = self.guard.shift_from_draft(id, department, draft)?;
        let stored = self.repository.insert_shift(shift)?;

        info!(
            shift = %stored.id.0,
            department = %stored.department.id.0,
            profession = %stored.profession_required,
            hourly_wage = stored.hourly_wage,
            "shift published"
        );
        Ok(stored)
    }

    pub fn get_shift(&self, shift_id: &ShiftId) -> Result<Shift, MarketplaceError> {
        let shift = self
            .repository
            .fetch_shift(shift_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(shift)
    }

    /// Open shifts starting after `now`, soonest first.
    pub fn open_shifts(
        &self,
        filter: &ShiftFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Shift>, MarketplaceError> {
        let mut shifts: Vec<Shift> = self
            .repository
            .shifts_with_status(ShiftStatus::Open)?
            .into_iter()
            .filter(|shift| shift.start_time > now && filter.matches(shift))
            .collect();
        shifts.sort_by_key(|shift| shift.start_time);
        Ok(shifts)
    }

    /// Every shift the department posted, latest start first.
    pub fn department_shifts(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<Shift>, MarketplaceError> {
        let mut shifts = self.repository.department_shifts(department_id)?;
        shifts.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(shifts)
    }

    /// Assigned shifts starting after `now` with their contracted worker, soonest first.
    pub fn upcoming_shifts(
        &self,
        department_id: &DepartmentId,
        now: DateTime<Utc>,
    ) -> Result<Vec<StaffedShift>, MarketplaceError> {
        let shifts = self
            .repository
            .department_shifts(department_id)?
            .into_iter()
            .filter(|shift| shift.status == ShiftStatus::Assigned && shift.start_time > now)
            .collect();
        let mut staffed = self.staffed(shifts, Some(ContractStatus::Active))?;
        staffed.sort_by_key(|entry| entry.shift.start_time);
        Ok(staffed)
    }

    /// Completed shifts with their worker, latest start first, capped at 50.
    pub fn completed_shifts(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<StaffedShift>, MarketplaceError> {
        let shifts = self
            .repository
            .department_shifts(department_id)?
            .into_iter()
            .filter(|shift| shift.status == ShiftStatus::Completed)
            .collect();
        let mut staffed = self.staffed(shifts, None)?;
        staffed.sort_by(|a, b| b.shift.start_time.cmp(&a.shift.start_time));
        staffed.truncate(COMPLETED_SHIFT_LIMIT);
        Ok(staffed)
    }

    pub fn update_shift_status(
        &self,
        shift_id: &ShiftId,
        status: ShiftStatus,
    ) -> Result<Shift, MarketplaceError> {
        let shift = self.repository.update_shift_status(shift_id, status)?;
        info!(shift = %shift_id.0, status = status.label(), "shift status updated");
        Ok(shift)
    }

    /// Rank available workers of `profession` for the offered wage (`0` for no preference).
    pub fn eligible_workers(
        &self,
        profession: &str,
        offered_wage: u32,
    ) -> Result<Vec<RankedCandidate>, MarketplaceError> {
        let limit = self.scorer.config().candidate_limit;
        let candidates = self.workers.available_candidates(profession, limit)?;
        let ranked = self.scorer.rank(offered_wage, candidates);
        info!(
            profession,
            offered_wage,
            candidates = ranked.len(),
            "ranked eligible workers"
        );
        Ok(ranked)
    }

    /// Queue shift announcements for every eligible worker on the channels selected for
    /// them; workers without an override get every channel.
    pub fn notify_eligible_workers(
        &self,
        shift_id: &ShiftId,
        overrides: &BTreeMap<WorkerId, ChannelSelection>,
        now: DateTime<Utc>,
    ) -> Result<NotificationBatch, MarketplaceError> {
        let shift = self.get_shift(shift_id)?;
        if shift.status != ShiftStatus::Open {
            return Err(MarketplaceError::ShiftNotOpen {
                shift_id: shift.id,
                status: shift.status,
            });
        }

        let ranked = self.eligible_workers(&shift.profession_required, shift.hourly_wage)?;
        let mut queued = 0;
        for candidate in &ranked {
            let worker_id = &candidate.scored.candidate.worker_id;
            let selection = overrides.get(worker_id).copied().unwrap_or_default();
            for channel in selection.channels() {
                let notification = Notification::shift_published(
                    NotificationId(next_id(&NOTIFICATION_SEQUENCE, "notification")),
                    worker_id.clone(),
                    channel,
                    &shift,
                    now,
                );
                self.notifications.enqueue(notification)?;
                queued += 1;
            }
        }

        info!(shift = %shift.id.0, candidates = ranked.len(), queued, "shift notifications queued");
        Ok(NotificationBatch {
            candidates: ranked.len(),
            queued,
        })
    }

    /// Apply to an open shift on behalf of the signed-in worker.
    pub fn apply(
        &self,
        session: &SessionContext,
        shift_id: &ShiftId,
        message: String,
        now: DateTime<Utc>,
    ) -> Result<ShiftApplication, MarketplaceError> {
        let worker_id = session.worker_id().ok_or(MarketplaceError::Forbidden {
            required: SessionRole::Worker,
        })?;
        let shift = self.get_shift(shift_id)?;
        if shift.status != ShiftStatus::Open {
            return Err(MarketplaceError::ShiftNotOpen {
                shift_id: shift.id,
                status: shift.status,
            });
        }

        let application = ShiftApplication {
            id: ApplicationId(next_id(&APPLICATION_SEQUENCE, "application")),
            shift_id: shift.id,
            worker_id,
            message: message.trim().to_string(),
            status: ApplicationStatus::Pending,
            created_at: now,
        };
        let stored = self.repository.insert_application(application)?;
        info!(application = %stored.id.0, shift = %stored.shift_id.0, worker = %stored.worker_id.0, "application submitted");
        Ok(stored)
    }

    /// Approve a pending application: mark it approved, create the contract, then assign the
    /// shift. The writes are sequential and a failure part-way leaves earlier writes in place.
    pub fn approve_application(
        &self,
        application_id: &ApplicationId,
        now: DateTime<Utc>,
    ) -> Result<ApprovalOutcome, MarketplaceError> {
        let pending = self.pending_application(application_id)?;
        let shift = self.get_shift(&pending.shift_id)?;
        if shift.status != ShiftStatus::Open {
            return Err(MarketplaceError::ShiftNotOpen {
                shift_id: shift.id,
                status: shift.status,
            });
        }

        let application = self
            .repository
            .update_application_status(application_id, ApplicationStatus::Approved)?;

        let contract = Contract {
            id: ContractId(next_id(&CONTRACT_SEQUENCE, "contract")),
            shift_id: application.shift_id.clone(),
            worker_id: application.worker_id.clone(),
            status: ContractStatus::Active,
            created_at: now,
        };
        let contract = self.repository.insert_contract(contract).map_err(|err| {
            warn!(application = %application_id.0, error = %err, "contract write failed after approval");
            err
        })?;

        let shift = self
            .repository
            .update_shift_status(&application.shift_id, ShiftStatus::Assigned)
            .map_err(|err| {
                warn!(application = %application_id.0, error = %err, "shift assignment failed after contract write");
                err
            })?;

        info!(
            application = %application.id.0,
            contract = %contract.id.0,
            shift = %shift.id.0,
            "application approved"
        );
        Ok(ApprovalOutcome {
            application,
            contract,
            shift,
        })
    }

    pub fn reject_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ShiftApplication, MarketplaceError> {
        self.pending_application(application_id)?;
        let application = self
            .repository
            .update_application_status(application_id, ApplicationStatus::Rejected)?;
        info!(application = %application.id.0, "application rejected");
        Ok(application)
    }

    /// Pending applications across the department's shifts, newest first.
    pub fn pending_applications(
        &self,
        department_id: &DepartmentId,
    ) -> Result<Vec<ShiftApplication>, MarketplaceError> {
        let mut pending = Vec::new();
        for shift in self.repository.department_shifts(department_id)? {
            pending.extend(
                self.repository
                    .shift_applications(&shift.id)?
                    .into_iter()
                    .filter(|application| application.status == ApplicationStatus::Pending),
            );
        }
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    /// Every application the worker submitted, newest first.
    pub fn worker_applications(
        &self,
        worker_id: &WorkerId,
    ) -> Result<Vec<ShiftApplication>, MarketplaceError> {
        let mut applications = self.repository.worker_applications(worker_id)?;
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }

    /// Record availability on behalf of the signed-in worker.
    pub fn post_availability(
        &self,
        session: &SessionContext,
        posting: AvailabilityPosting,
    ) -> Result<AvailabilityRecord, MarketplaceError> {
        let worker_id = session.worker_id().ok_or(MarketplaceError::Forbidden {
            required: SessionRole::Worker,
        })?;
        let record = self.guard.availability_from_posting(worker_id, posting)?;
        let stored = self.workers.record_availability(record)?;
        info!(worker = %stored.worker_id.0, recurring = stored.is_recurring, "availability posted");
        Ok(stored)
    }

    /// Register a worker profile after upstream sign-in; the personal number comes back
    /// masked.
    pub fn register_worker(
        &self,
        registration: WorkerRegistration,
    ) -> Result<RegisteredWorker, MarketplaceError> {
        let id = WorkerId(next_id(&WORKER_SEQUENCE, "worker"));
        let profile = self.guard.worker_from_registration(id, registration)?;
        let stored = self.workers.insert_worker(profile)?;
        let personal_number = stored
            .personal_number
            .as_ref()
            .map(|number| number.masked())
            .unwrap_or_default();

        info!(worker = %stored.id.0, profession = %stored.profession, "worker registered");
        Ok(RegisteredWorker {
            profile: stored,
            personal_number,
        })
    }

    pub fn register_department(
        &self,
        registration: DepartmentRegistration,
    ) -> Result<Department, MarketplaceError> {
        let id = DepartmentId(next_id(&DEPARTMENT_SEQUENCE, "dept"));
        let department = self.guard.department_from_registration(id, registration)?;
        let stored = self.repository.insert_department(department)?;
        info!(department = %stored.id.0, municipality = %stored.municipality_name, "department registered");
        Ok(stored)
    }

    /// Inner join of shifts with their contract and contracted worker; shifts missing
    /// either are left out.
    fn staffed(
        &self,
        shifts: Vec<Shift>,
        contract_status: Option<ContractStatus>,
    ) -> Result<Vec<StaffedShift>, MarketplaceError> {
        let mut staffed = Vec::with_capacity(shifts.len());
        for shift in shifts {
            let contract = self
                .repository
                .shift_contracts(&shift.id)?
                .into_iter()
                .find(|contract| contract_status.map_or(true, |status| contract.status == status));
            let Some(contract) = contract else {
                continue;
            };
            let Some(worker) = self.workers.fetch_worker(&contract.worker_id)? else {
                continue;
            };
            staffed.push(StaffedShift {
                shift,
                contract,
                worker: worker.summary(),
            });
        }
        Ok(staffed)
    }

    fn pending_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ShiftApplication, MarketplaceError> {
        let application = self
            .repository
            .fetch_application(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        if application.status != ApplicationStatus::Pending {
            return Err(MarketplaceError::ApplicationNotPending {
                application_id: application.id,
                status: application.status,
            });
        }
        Ok(application)
    }
}

/// Error raised by the marketplace service.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error("this action requires a {} session", .required.label())]
    Forbidden { required: SessionRole },
    #[error("shift {} is {}, not open", .shift_id.0, .status.label())]
    ShiftNotOpen {
        shift_id: ShiftId,
        status: ShiftStatus,
    },
    #[error("application {} is already {}", .application_id.0, .status.label())]
    ApplicationNotPending {
        application_id: ApplicationId,
        status: ApplicationStatus,
    },
}
