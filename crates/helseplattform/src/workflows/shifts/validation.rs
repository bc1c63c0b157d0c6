use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    AvailabilityPosting, AvailabilityRecord, Department, DepartmentId, DepartmentRegistration,
    Shift, ShiftDraft, ShiftId, ShiftStatus, WorkerId, WorkerProfile, WorkerRegistration,
    WorkerStatus,
};
use crate::identity::{PersonalNumber, PersonalNumberError};

const MIN_USERNAME_LEN: usize = 3;
const MIN_HPR_NUMBER_LEN: usize = 7;

/// Intake validation errors for shift drafts and availability postings.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("profession is required")]
    MissingProfession,
    #[error("hourly wage must be greater than zero")]
    InvalidHourlyWage,
    #[error("shift must end after it starts (start {start}, end {end})")]
    EndsBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("select at least one shift type")]
    NoShiftTypes,
    #[error("recurring availability requires a recurrence pattern")]
    MissingRecurrencePattern,
    #[error("recurring availability requires an end date")]
    MissingRecurrenceEnd,
    #[error("recurrence ends {end} before the posted day {date}")]
    RecurrenceEndsBeforeStart { date: NaiveDate, end: NaiveDate },
    #[error("username must be at least 3 characters")]
    UsernameTooShort,
    #[error("full name is required")]
    MissingFullName,
    #[error("HPR number must be at least 7 characters")]
    InvalidHprNumber,
    #[error("hourly rate must be greater than zero")]
    InvalidHourlyRate,
    #[error(transparent)]
    PersonalNumber(#[from] PersonalNumberError),
    #[error("{0} is required")]
    MissingDepartmentField(&'static str),
}

/// Guard turning raw drafts into storable records.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard;

impl IntakeGuard {
    pub fn shift_from_draft(
        &self,
        id: ShiftId,
        department: Department,
        draft: ShiftDraft,
    ) -> Result<Shift, ValidationError> {
        let profession = draft.profession.trim();
        if profession.is_empty() {
            return Err(ValidationError::MissingProfession);
        }
        if draft.hourly_wage == 0 {
            return Err(ValidationError::InvalidHourlyWage);
        }
        if draft.end_time <= draft.start_time {
            return Err(ValidationError::EndsBeforeStart {
                start: draft.start_time,
                end: draft.end_time,
            });
        }

        Ok(Shift {
            id,
            department,
            start_time: draft.start_time,
            end_time: draft.end_time,
            profession_required: profession.to_string(),
            hourly_wage: draft.hourly_wage,
            description: draft.description.trim().to_string(),
            status: ShiftStatus::Open,
        })
    }

    pub fn availability_from_posting(
        &self,
        worker_id: WorkerId,
        posting: AvailabilityPosting,
    ) -> Result<AvailabilityRecord, ValidationError> {
        if posting.preferred_shift_types.is_empty() {
            return Err(ValidationError::NoShiftTypes);
        }

        let (recurrence_pattern, recurrence_end_date) = if posting.is_recurring {
            let pattern = posting
                .recurrence_pattern
                .ok_or(ValidationError::MissingRecurrencePattern)?;
            let end = posting
                .recurrence_end_date
                .ok_or(ValidationError::MissingRecurrenceEnd)?;
            if end < posting.date {
                return Err(ValidationError::RecurrenceEndsBeforeStart {
                    date: posting.date,
                    end,
                });
            }
            (Some(pattern), Some(end))
        } else {
            (None, None)
        };

        let mut shift_types = posting.preferred_shift_types;
        shift_types.sort();
        shift_types.dedup();

        Ok(AvailabilityRecord {
            worker_id,
            start_time: day_start(posting.date),
            end_time: day_end(posting.date),
            is_recurring: posting.is_recurring,
            recurrence_pattern,
            recurrence_end_date,
            preferred_shift_types: shift_types,
            notes: posting.notes.trim().to_string(),
            status: WorkerStatus::Available,
        })
    }

    pub fn worker_from_registration(
        &self,
        id: WorkerId,
        registration: WorkerRegistration,
    ) -> Result<WorkerProfile, ValidationError> {
        let username = checked_username(&registration.username)?;
        let full_name = registration.full_name.trim();
        if full_name.is_empty() {
            return Err(ValidationError::MissingFullName);
        }
        let hpr_number = registration.hpr_number.trim();
        if hpr_number.chars().count() < MIN_HPR_NUMBER_LEN {
            return Err(ValidationError::InvalidHprNumber);
        }
        let profession = registration.profession.trim();
        if profession.is_empty() {
            return Err(ValidationError::MissingProfession);
        }
        if registration.hourly_rate == 0 {
            return Err(ValidationError::InvalidHourlyRate);
        }
        let personal_number = PersonalNumber::parse(&registration.personal_number)?;

        Ok(WorkerProfile {
            id,
            full_name: full_name.to_string(),
            email: format!("{username}@helsepersonell.no"),
            username,
            profession: profession.to_string(),
            hourly_rate: registration.hourly_rate,
            average_rating: None,
            total_reviews: 0,
            status: WorkerStatus::Available,
            hpr_number: Some(hpr_number.to_string()),
            personal_number: Some(personal_number),
        })
    }

    /// Every department field is required, cost center included.
    pub fn department_from_registration(
        &self,
        id: DepartmentId,
        registration: DepartmentRegistration,
    ) -> Result<Department, ValidationError> {
        checked_username(&registration.username)?;
        let required = |value: &str, field: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ValidationError::MissingDepartmentField(field))
            } else {
                Ok(value.to_string())
            }
        };

        Ok(Department {
            id,
            municipality_name: required(&registration.municipality, "municipality")?,
            department_name: required(&registration.department, "department")?,
            cost_center_code: Some(required(&registration.cost_center, "cost center")?),
        })
    }
}

fn checked_username(raw: &str) -> Result<String, ValidationError> {
    let username = raw.trim();
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(ValidationError::UsernameTooShort);
    }
    Ok(username.to_string())
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> DateTime<Utc> {
    let last_millisecond = chrono::NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or(chrono::NaiveTime::MIN);
    date.and_time(last_millisecond).and_utc()
}
