use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use super::common::*;
use crate::identity::{PersonalNumberError, SessionContext, SessionRole};
use crate::workflows::notifications::{ChannelSelection, NotificationChannel, NotificationStatus};
use crate::workflows::shifts::domain::{
    ApplicationStatus, AvailabilityPosting, ContractStatus, DepartmentId,
    DepartmentRegistration, ShiftFilter, ShiftId, ShiftStatus, ShiftType, WorkerId,
    WorkerRegistration, WorkerStatus,
};
use crate::workflows::shifts::matching::MatchingConfig;
use crate::workflows::shifts::repository::{RepositoryError, ShiftRepository, WorkerDirectory};
use crate::workflows::shifts::service::{MarketplaceError, ShiftMarketplaceService};
use crate::workflows::shifts::validation::ValidationError;

fn gran() -> SessionContext {
    SessionContext::department("dept-gran")
}

#[test]
fn create_shift_requires_department_session() {
    let (service, _, _, _) = build_service();

    match service.create_shift(&SessionContext::worker("w-anne"), draft("Sykepleier", 450, 2)) {
        Err(MarketplaceError::Forbidden {
            required: SessionRole::Department,
        }) => {}
        other => panic!("expected forbidden error, got {other:?}"),
    }
}

#[test]
fn create_shift_snapshots_department_and_opens() {
    let (service, _, _, _) = build_service();

    let shift = service
        .create_shift(&gran(), draft("  Sykepleier ", 450, 2))
        .expect("shift created");

    assert_eq!(shift.status, ShiftStatus::Open);
    assert_eq!(shift.profession_required, "Sykepleier");
    assert_eq!(shift.department, department());
    assert!(shift.id.0.starts_with("shift-"));
    assert_eq!(service.get_shift(&shift.id).expect("stored"), shift);
}

#[test]
fn create_shift_propagates_validation_errors() {
    let (service, _, _, _) = build_service();

    match service.create_shift(&gran(), draft("Sykepleier", 0, 2)) {
        Err(MarketplaceError::Validation(ValidationError::InvalidHourlyWage)) => {}
        other => panic!("expected wage validation error, got {other:?}"),
    }
}

#[test]
fn create_shift_for_unknown_department_is_not_found() {
    let (service, _, _, _) = build_service();

    match service.create_shift(
        &SessionContext::department("dept-unknown"),
        draft("Sykepleier", 450, 2),
    ) {
        Err(MarketplaceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found error, got {other:?}"),
    }
}

#[test]
fn open_shifts_skip_started_shifts_and_sort_by_start() {
    let (service, _, _, _) = build_service();

    let later = service
        .create_shift(&gran(), draft("Sykepleier", 450, 5))
        .expect("later shift");
    let sooner = service
        .create_shift(&gran(), draft("Sykepleier", 450, 1))
        .expect("sooner shift");
    service
        .create_shift(&gran(), draft("Sykepleier", 450, -1))
        .expect("past shift");
    service
        .create_shift(
            &SessionContext::department("dept-lunner"),
            draft("Helsefagarbeider", 380, 3),
        )
        .expect("other municipality");

    let filter = ShiftFilter {
        municipality: Some("Gran kommune".to_string()),
        ..ShiftFilter::default()
    };
    let shifts = service.open_shifts(&filter, now()).expect("listing succeeds");
    let ids: Vec<_> = shifts.iter().map(|shift| shift.id.clone()).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let nurses_only = ShiftFilter {
        profession: Some("Helsefagarbeider".to_string()),
        ..ShiftFilter::default()
    };
    let shifts = service
        .open_shifts(&nurses_only, now())
        .expect("listing succeeds");
    assert_eq!(shifts.len(), 1);
    assert_eq!(shifts[0].department.id, DepartmentId("dept-lunner".to_string()));
}

#[test]
fn department_shifts_are_latest_first() {
    let (service, _, _, _) = build_service();
    let first = service
        .create_shift(&gran(), draft("Sykepleier", 450, 1))
        .expect("first shift");
    let second = service
        .create_shift(&gran(), draft("Sykepleier", 450, 4))
        .expect("second shift");

    let shifts = service
        .department_shifts(&department().id)
        .expect("listing succeeds");
    assert_eq!(shifts[0].id, second.id);
    assert_eq!(shifts[1].id, first.id);
}

#[test]
fn eligible_workers_rank_directory_candidates() {
    let (service, _, _, _) = build_service();

    let ranked = service
        .eligible_workers("Sykepleier", 450)
        .expect("ranking succeeds");
    let scores: Vec<u16> = ranked
        .iter()
        .map(|candidate| candidate.scored.match_score)
        .collect();

    assert_eq!(ranked[0].scored.candidate.worker_id.0, "w-anne");
    assert_eq!(scores, vec![170, 150, 125]);
    assert!(service
        .eligible_workers("Lege", 900)
        .expect("ranking succeeds")
        .is_empty());
}

#[test]
fn eligible_workers_honour_candidate_limit() {
    let (_, repository, directory, queue) = build_service();
    let service = ShiftMarketplaceService::new(
        repository,
        directory,
        queue,
        MatchingConfig {
            candidate_limit: 2,
            ..MatchingConfig::default()
        },
    );

    let ranked = service
        .eligible_workers("Sykepleier", 450)
        .expect("ranking succeeds");
    assert_eq!(ranked.len(), 2);
}

#[test]
fn eligible_workers_propagate_directory_outage() {
    let (_, repository, _, queue) = build_service();
    let service = ShiftMarketplaceService::new(
        repository,
        Arc::new(UnavailableDirectory),
        queue,
        MatchingConfig::default(),
    );

    match service.eligible_workers("Sykepleier", 450) {
        Err(MarketplaceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable error, got {other:?}"),
    }
}

#[test]
fn notify_queues_one_row_per_selected_channel() {
    let (service, _, _, queue) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");

    let mut overrides = BTreeMap::new();
    overrides.insert(
        WorkerId("w-cato".to_string()),
        ChannelSelection {
            email: true,
            sms: false,
            push: false,
        },
    );

    let batch = service
        .notify_eligible_workers(&shift.id, &overrides, now())
        .expect("notifications queued");

    assert_eq!(batch.candidates, 3);
    assert_eq!(batch.queued, 7);

    let rows = queue.rows();
    assert_eq!(rows.len(), 7);
    assert!(rows
        .iter()
        .all(|row| row.status == NotificationStatus::Pending && row.scheduled_for == now()));
    let cato: Vec<NotificationChannel> = rows
        .iter()
        .filter(|row| row.recipient.0 == "w-cato")
        .map(|row| row.channel)
        .collect();
    assert_eq!(cato, vec![NotificationChannel::Email]);
}

#[test]
fn notify_refuses_closed_shifts() {
    let (service, _, _, queue) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");
    service
        .update_shift_status(&shift.id, ShiftStatus::Cancelled)
        .expect("status updated");

    match service.notify_eligible_workers(&shift.id, &BTreeMap::new(), now()) {
        Err(MarketplaceError::ShiftNotOpen {
            status: ShiftStatus::Cancelled,
            ..
        }) => {}
        other => panic!("expected shift not open error, got {other:?}"),
    }
    assert!(queue.rows().is_empty());
}

#[test]
fn apply_requires_worker_session_and_open_shift() {
    let (service, _, _, _) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");

    match service.apply(&gran(), &shift.id, String::new(), now()) {
        Err(MarketplaceError::Forbidden {
            required: SessionRole::Worker,
        }) => {}
        other => panic!("expected forbidden error, got {other:?}"),
    }

    let application = service
        .apply(
            &SessionContext::worker("w-anne"),
            &shift.id,
            " Kan ta vakten ".to_string(),
            now(),
        )
        .expect("application stored");
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.message, "Kan ta vakten");

    service
        .update_shift_status(&shift.id, ShiftStatus::Assigned)
        .expect("status updated");
    assert!(matches!(
        service.apply(&SessionContext::worker("w-bjorn"), &shift.id, String::new(), now()),
        Err(MarketplaceError::ShiftNotOpen { .. })
    ));
}

#[test]
fn approval_marks_application_creates_contract_and_assigns_shift() {
    let (service, repository, _, _) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");
    let application = service
        .apply(&SessionContext::worker("w-anne"), &shift.id, String::new(), now())
        .expect("application stored");

    let outcome = service
        .approve_application(&application.id, now())
        .expect("approval succeeds");

    assert_eq!(outcome.application.status, ApplicationStatus::Approved);
    assert_eq!(outcome.contract.status, ContractStatus::Active);
    assert_eq!(outcome.contract.worker_id, WorkerId("w-anne".to_string()));
    assert_eq!(outcome.shift.status, ShiftStatus::Assigned);
    assert_eq!(repository.contracts(), vec![outcome.contract.clone()]);

    match service.approve_application(&application.id, now()) {
        Err(MarketplaceError::ApplicationNotPending {
            status: ApplicationStatus::Approved,
            ..
        }) => {}
        other => panic!("expected not pending error, got {other:?}"),
    }
    assert_eq!(repository.contracts().len(), 1);
}

#[test]
fn rejection_only_touches_the_application() {
    let (service, repository, _, _) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");
    let application = service
        .apply(&SessionContext::worker("w-anne"), &shift.id, String::new(), now())
        .expect("application stored");

    let rejected = service
        .reject_application(&application.id)
        .expect("rejection succeeds");

    assert_eq!(rejected.status, ApplicationStatus::Rejected);
    assert_eq!(
        service.get_shift(&shift.id).expect("shift").status,
        ShiftStatus::Open
    );
    assert!(repository.contracts().is_empty());
}

#[test]
fn pending_and_worker_application_listings() {
    let (service, _, _, _) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");
    let anne = service
        .apply(&SessionContext::worker("w-anne"), &shift.id, String::new(), now())
        .expect("anne applies");
    let bjorn = service
        .apply(
            &SessionContext::worker("w-bjorn"),
            &shift.id,
            String::new(),
            now() + Duration::minutes(5),
        )
        .expect("bjorn applies");
    service
        .reject_application(&anne.id)
        .expect("rejection succeeds");

    let pending = service
        .pending_applications(&department().id)
        .expect("listing succeeds");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, bjorn.id);

    let history = service
        .worker_applications(&WorkerId("w-anne".to_string()))
        .expect("listing succeeds");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ApplicationStatus::Rejected);
}

#[test]
fn availability_is_recorded_for_worker_sessions() {
    let (service, _, directory, _) = build_service();
    let posting = AvailabilityPosting {
        date: NaiveDate::from_ymd_opt(2025, 12, 15).expect("valid date"),
        is_recurring: false,
        recurrence_pattern: None,
        recurrence_end_date: None,
        preferred_shift_types: vec![ShiftType::Night, ShiftType::Day],
        notes: String::new(),
    };

    assert!(matches!(
        service.post_availability(&gran(), posting.clone()),
        Err(MarketplaceError::Forbidden { .. })
    ));

    let record = service
        .post_availability(&SessionContext::worker("w-anne"), posting)
        .expect("availability stored");
    assert_eq!(record.preferred_shift_types, vec![ShiftType::Day, ShiftType::Night]);
    assert_eq!(directory.availability(), vec![record]);
}

fn staffed_shift(service: &TestService, worker: &str, starts_in_days: i64) -> ShiftId {
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, starts_in_days))
        .expect("shift created");
    let application = service
        .apply(&SessionContext::worker(worker), &shift.id, String::new(), now())
        .expect("application stored");
    service
        .approve_application(&application.id, now())
        .expect("approval succeeds");
    shift.id
}

#[test]
fn approval_stops_after_contract_write_failure() {
    let repository = Arc::new(ContractOfflineRepository {
        inner: MemoryShiftRepository::with_departments(vec![department()]),
    });
    let service = ShiftMarketplaceService::new(
        repository.clone(),
        Arc::new(MemoryDirectory::with_workers(vec![worker("w-anne", 450, Some(4.6), 25)])),
        Arc::new(MemoryQueue::default()),
        MatchingConfig::default(),
    );
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");
    let application = service
        .apply(&SessionContext::worker("w-anne"), &shift.id, String::new(), now())
        .expect("application stored");

    match service.approve_application(&application.id, now()) {
        Err(MarketplaceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected unavailable error, got {other:?}"),
    }

    let stored = repository
        .fetch_application(&application.id)
        .expect("fetch succeeds")
        .expect("application exists");
    assert_eq!(stored.status, ApplicationStatus::Approved);
    assert_eq!(
        service.get_shift(&shift.id).expect("shift").status,
        ShiftStatus::Open
    );
    assert!(repository.inner.contracts().is_empty());
}

#[test]
fn second_approval_for_an_assigned_shift_is_refused() {
    let (service, repository, _, _) = build_service();
    let shift = service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("shift created");
    let anne = service
        .apply(&SessionContext::worker("w-anne"), &shift.id, String::new(), now())
        .expect("anne applies");
    let bjorn = service
        .apply(&SessionContext::worker("w-bjorn"), &shift.id, String::new(), now())
        .expect("bjorn applies");

    service
        .approve_application(&anne.id, now())
        .expect("first approval succeeds");

    match service.approve_application(&bjorn.id, now()) {
        Err(MarketplaceError::ShiftNotOpen {
            status: ShiftStatus::Assigned,
            ..
        }) => {}
        other => panic!("expected shift not open error, got {other:?}"),
    }
    assert_eq!(repository.contracts().len(), 1);
    let pending = service
        .pending_applications(&department().id)
        .expect("listing succeeds");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, bjorn.id);
}

#[test]
fn upcoming_shifts_join_contract_and_worker_soonest_first() {
    let (service, _, _, _) = build_service();
    let in_five = staffed_shift(&service, "w-anne", 5);
    let in_one = staffed_shift(&service, "w-bjorn", 1);
    let in_three = staffed_shift(&service, "w-anne", 3);
    service
        .create_shift(&gran(), draft("Sykepleier", 450, 2))
        .expect("open shift");

    let upcoming = service
        .upcoming_shifts(&department().id, now())
        .expect("listing succeeds");
    let ids: Vec<_> = upcoming.iter().map(|entry| entry.shift.id.clone()).collect();
    assert_eq!(ids, vec![in_one, in_three.clone(), in_five.clone()]);
    assert_eq!(upcoming[0].worker.id, WorkerId("w-bjorn".to_string()));
    assert_eq!(upcoming[0].contract.status, ContractStatus::Active);

    let later = service
        .upcoming_shifts(&department().id, now() + Duration::days(2))
        .expect("listing succeeds");
    let ids: Vec<_> = later.iter().map(|entry| entry.shift.id.clone()).collect();
    assert_eq!(ids, vec![in_three, in_five]);

    assert!(service
        .upcoming_shifts(&other_department().id, now())
        .expect("listing succeeds")
        .is_empty());
}

#[test]
fn completed_shifts_are_latest_first_and_capped() {
    let (service, _, _, _) = build_service();
    let mut latest = None;
    for day in 1..=52 {
        let shift_id = staffed_shift(&service, "w-anne", day);
        service
            .update_shift_status(&shift_id, ShiftStatus::Completed)
            .expect("status updated");
        latest = Some(shift_id);
    }
    let unstaffed = service
        .create_shift(&gran(), draft("Sykepleier", 450, 90))
        .expect("unstaffed shift");
    service
        .update_shift_status(&unstaffed.id, ShiftStatus::Completed)
        .expect("status updated");

    let completed = service
        .completed_shifts(&department().id)
        .expect("listing succeeds");

    assert_eq!(completed.len(), 50);
    assert_eq!(Some(completed[0].shift.id.clone()), latest);
    assert!(completed
        .windows(2)
        .all(|pair| pair[0].shift.start_time >= pair[1].shift.start_time));
    assert!(completed.iter().all(|entry| entry.shift.id != unstaffed.id));
    assert_eq!(completed[0].worker.username, "w-anne");
}

fn registration() -> WorkerRegistration {
    WorkerRegistration {
        username: " kari ".to_string(),
        full_name: "Kari Nordmann".to_string(),
        personal_number: "010190 00245".to_string(),
        hpr_number: "1234567".to_string(),
        profession: "Sykepleier".to_string(),
        hourly_rate: 480,
    }
}

#[test]
fn worker_registration_masks_personal_number_and_joins_matching() {
    let (service, _, directory, _) = build_service();

    let registered = service
        .register_worker(registration())
        .expect("registration succeeds");

    assert_eq!(registered.personal_number, "****** 00245");
    assert_eq!(registered.profile.username, "kari");
    assert_eq!(registered.profile.email, "kari@helsepersonell.no");
    assert_eq!(registered.profile.status, WorkerStatus::Available);
    assert_eq!(registered.profile.hpr_number.as_deref(), Some("1234567"));
    let stored = directory
        .fetch_worker(&registered.profile.id)
        .expect("fetch succeeds")
        .expect("worker stored");
    assert_eq!(
        stored.personal_number.map(String::from).as_deref(),
        Some("01019000245")
    );

    let ranked = service
        .eligible_workers("Sykepleier", 480)
        .expect("ranking succeeds");
    assert!(ranked
        .iter()
        .any(|candidate| candidate.scored.candidate.worker_id == registered.profile.id));

    match service.register_worker(registration()) {
        Err(MarketplaceError::Repository(RepositoryError::Conflict)) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn worker_registration_rejects_bad_personal_number() {
    let (service, _, _, _) = build_service();
    let mut bad = registration();
    bad.personal_number = "01019000246".to_string();

    match service.register_worker(bad) {
        Err(MarketplaceError::Validation(ValidationError::PersonalNumber(
            PersonalNumberError::ChecksumMismatch,
        ))) => {}
        other => panic!("expected checksum error, got {other:?}"),
    }
}

#[test]
fn department_registration_stores_a_usable_department() {
    let (service, _, _, _) = build_service();

    let department = service
        .register_department(DepartmentRegistration {
            username: "leder".to_string(),
            municipality: " Jevnaker kommune ".to_string(),
            department: "Legevakten".to_string(),
            cost_center: "5120".to_string(),
        })
        .expect("registration succeeds");

    assert_eq!(department.municipality_name, "Jevnaker kommune");
    assert_eq!(department.cost_center_code.as_deref(), Some("5120"));
    let shift = service
        .create_shift(
            &SessionContext::department(department.id.0.clone()),
            draft("Sykepleier", 450, 2),
        )
        .expect("new department can publish");
    assert_eq!(shift.department, department);
}
