//! Shift marketplace: departments post shifts, workers apply, departments approve.
//!
//! The [`matching`] module ranks candidate workers for a shift; everything else here is
//! the workflow around it. Storage lives behind [`ShiftRepository`] and
//! [`WorkerDirectory`] so the service can run against in-memory or hosted backends.

pub mod domain;
pub mod import;
pub mod matching;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, AvailabilityPosting, AvailabilityRecord, Contract,
    ContractId, ContractStatus, Department, DepartmentId, DepartmentRegistration,
    RecurrencePattern, RegisteredWorker, Shift, ShiftApplication, ShiftDraft, ShiftFilter,
    ShiftId, ShiftStatus, ShiftType, StaffedShift, WorkerId, WorkerProfile, WorkerRegistration,
    WorkerStatus, WorkerSummary,
};
pub use import::{CandidateCsvImporter, CandidateImportError};
pub use matching::{
    score_candidates, Candidate, MatchScorer, MatchTier, MatchingConfig, RankedCandidate,
    ScoredCandidate,
};
pub use repository::{RepositoryError, ShiftRepository, WorkerDirectory};
pub use router::shift_router;
pub use service::{ApprovalOutcome, MarketplaceError, NotificationBatch, ShiftMarketplaceService};
pub use validation::{IntakeGuard, ValidationError};
