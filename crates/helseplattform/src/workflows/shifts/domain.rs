use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::matching::Candidate;
use crate::identity::PersonalNumber;

/// Identifier wrapper for registered workers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkerId(pub String);

/// Identifier wrapper for municipal departments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepartmentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

/// Municipal organizational unit posting shifts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub municipality_name: String,
    pub department_name: String,
    #[serde(default)]
    pub cost_center_code: Option<String>,
}

/// Whether a worker is currently taking shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Available,
    Busy,
}

impl WorkerStatus {
    pub const fn label(self) -> &'static str {
        match self {
            WorkerStatus::Available => "available",
            WorkerStatus::Busy => "busy",
        }
    }
}

/// Healthcare professional registered on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: WorkerId,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub profession: String,
    pub hourly_rate: u32,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_reviews: u32,
    pub status: WorkerStatus,
    /// Health personnel register (HPR) number.
    #[serde(default)]
    pub hpr_number: Option<String>,
    #[serde(default, skip_serializing)]
    pub personal_number: Option<PersonalNumber>,
}

impl WorkerProfile {
    pub fn candidate(&self) -> Candidate {
        Candidate {
            worker_id: self.id.clone(),
            profession: self.profession.clone(),
            hourly_rate: self.hourly_rate,
            average_rating: self.average_rating,
            total_reviews: self.total_reviews,
        }
    }

    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            username: self.username.clone(),
            profession: self.profession.clone(),
        }
    }
}

/// Name card shown next to a staffed shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub id: WorkerId,
    pub full_name: String,
    pub username: String,
    pub profession: String,
}

/// Sign-up form for a worker who has authenticated upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRegistration {
    pub username: String,
    pub full_name: String,
    pub personal_number: String,
    pub hpr_number: String,
    pub profession: String,
    pub hourly_rate: u32,
}

/// Registered worker as returned to the client, personal number masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredWorker {
    #[serde(flatten)]
    pub profile: WorkerProfile,
    pub personal_number: String,
}

/// Sign-up form for a municipal department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRegistration {
    pub username: String,
    pub municipality: String,
    pub department: String,
    pub cost_center: String,
}

/// Department supplied fields for a new shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftDraft {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub profession: String,
    pub hourly_wage: u32,
    #[serde(default)]
    pub description: String,
}

/// Lifecycle of a posted shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Open,
    Assigned,
    Completed,
    Cancelled,
}

impl ShiftStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ShiftStatus::Open => "open",
            ShiftStatus::Assigned => "assigned",
            ShiftStatus::Completed => "completed",
            ShiftStatus::Cancelled => "cancelled",
        }
    }
}

/// Stored shift including the department snapshot taken at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub department: Department,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub profession_required: String,
    pub hourly_wage: u32,
    pub description: String,
    pub status: ShiftStatus,
}

/// Optional narrowing for the open shift listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftFilter {
    #[serde(default)]
    pub profession: Option<String>,
    #[serde(default)]
    pub municipality: Option<String>,
}

impl ShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        let profession_ok = self
            .profession
            .as_deref()
            .map_or(true, |profession| shift.profession_required == profession);
        let municipality_ok = self
            .municipality
            .as_deref()
            .map_or(true, |municipality| {
                shift.department.municipality_name == municipality
            });
        profession_ok && municipality_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// A worker's request to take a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftApplication {
    pub id: ApplicationId,
    pub shift_id: ShiftId,
    pub worker_id: WorkerId,
    pub message: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
}

/// Agreement created when a department approves an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub shift_id: ShiftId,
    pub worker_id: WorkerId,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

/// Assigned or completed shift joined with its contract and the contracted worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffedShift {
    #[serde(flatten)]
    pub shift: Shift,
    pub contract: Contract,
    pub worker: WorkerSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Day,
    Evening,
    Night,
    Weekend,
}

/// Worker supplied availability for a single day, optionally recurring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPosting {
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    pub preferred_shift_types: Vec<ShiftType>,
    #[serde(default)]
    pub notes: String,
}

/// Validated availability window spanning the whole posted day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub worker_id: WorkerId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub preferred_shift_types: Vec<ShiftType>,
    pub notes: String,
    pub status: WorkerStatus,
}
