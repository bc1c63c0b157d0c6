use crate::infra::{sample_departments, LoggingTransport, Marketplace};
use chrono::{Duration, Utc};
use clap::Args;
use helseplattform::config::AppConfig;
use helseplattform::error::AppError;
use helseplattform::identity::SessionContext;
use helseplattform::workflows::notifications::{
    ChannelSelection, NotificationDispatcher, NotificationStatus,
};
use helseplattform::workflows::shifts::{
    CandidateCsvImporter, MarketplaceError, MatchScorer, RankedCandidate, ShiftDraft,
    ShiftMarketplaceService,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// Offered hourly wage in NOK (0 means no wage preference)
    #[arg(long)]
    pub(crate) wage: u32,
    /// CSV export with worker_id,profession,hourly_rate,average_rating,total_reviews
    #[arg(long)]
    pub(crate) candidates: PathBuf,
    /// Minimum composite score labelled as a top match
    #[arg(long)]
    pub(crate) top_threshold: Option<u16>,
    /// Only rank candidates of this profession
    #[arg(long)]
    pub(crate) profession: Option<String>,
    /// Print the ranking as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Profession required for the demo shift
    #[arg(long, default_value = "Sykepleier")]
    pub(crate) profession: String,
    /// Hourly wage offered for the demo shift
    #[arg(long, default_value_t = 450)]
    pub(crate) wage: u32,
    /// Days from now until the demo shift starts
    #[arg(long, default_value_t = 2)]
    pub(crate) starts_in_days: i64,
}

pub(crate) fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let MatchArgs {
        wage,
        candidates,
        top_threshold,
        profession,
        json,
    } = args;

    let mut matching = AppConfig::load()?.matching;
    if let Some(threshold) = top_threshold {
        matching.top_match_threshold = threshold;
    }

    let mut candidates = CandidateCsvImporter::from_path(candidates)?;
    if let Some(profession) = profession.as_deref() {
        candidates.retain(|candidate| candidate.profession.eq_ignore_ascii_case(profession));
    }

    let ranked = MatchScorer::new(matching).rank(wage, candidates);
    if json {
        let payload = serde_json::to_string_pretty(&ranked).map_err(std::io::Error::from)?;
        println!("{payload}");
    } else {
        render_ranking(wage, &ranked);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        profession,
        wage,
        starts_in_days,
    } = args;

    let config = AppConfig::load()?;
    let marketplace = Marketplace::seeded();
    let service = ShiftMarketplaceService::new(
        marketplace.repository.clone(),
        marketplace.workers.clone(),
        marketplace.queue.clone(),
        config.matching.clone(),
    );
    let dispatcher = NotificationDispatcher::new(
        marketplace.queue.clone(),
        Arc::new(LoggingTransport::default()),
        config.notifications.clone(),
    );

    println!("HelsePlattform shift marketplace demo");

    let Some(department) = sample_departments().into_iter().next() else {
        println!("No sample departments available");
        return Ok(());
    };
    let department_session = SessionContext::department(department.id.0.clone());
    let now = Utc::now();
    let start_time = now + Duration::days(starts_in_days);
    let shift = service.create_shift(
        &department_session,
        ShiftDraft {
            start_time,
            end_time: start_time + Duration::hours(8),
            profession,
            hourly_wage: wage,
            description: "Dagvakt, erfaring med demensomsorg ønskes".to_string(),
        },
    )?;
    println!(
        "\n1. {} published {} ({}, {} NOK/h, starts {})",
        department.department_name,
        shift.id.0,
        shift.profession_required,
        shift.hourly_wage,
        shift.start_time.format("%d.%m.%Y %H:%M")
    );

    let ranked = service.eligible_workers(&shift.profession_required, shift.hourly_wage)?;
    println!("\n2. Eligible workers");
    render_ranking(shift.hourly_wage, &ranked);
    let Some(top) = ranked.first() else {
        println!("No eligible workers for {}", shift.profession_required);
        return Ok(());
    };
    let top_worker = top.scored.candidate.worker_id.clone();

    let mut overrides = BTreeMap::new();
    if let Some(runner_up) = ranked.get(1) {
        overrides.insert(
            runner_up.scored.candidate.worker_id.clone(),
            ChannelSelection {
                push: false,
                ..ChannelSelection::default()
            },
        );
    }
    let batch = service.notify_eligible_workers(&shift.id, &overrides, now)?;
    println!(
        "\n3. Queued {} notifications for {} candidates",
        batch.queued, batch.candidates
    );

    let summary = dispatcher
        .dispatch(now)
        .map_err(MarketplaceError::from)?;
    println!(
        "\n4. Dispatched {} notifications: {} delivered, {} failed",
        summary.processed,
        summary.delivered(),
        summary.processed - summary.delivered()
    );
    for result in summary.results.iter().filter(|result| !result.success) {
        println!(
            "   - {}: {}",
            result.id.0,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    let pending = marketplace
        .queue
        .rows()
        .iter()
        .filter(|row| row.status == NotificationStatus::Pending)
        .count();
    println!("   Still pending: {pending}");

    let application = service.apply(
        &SessionContext::worker(top_worker.0.clone()),
        &shift.id,
        "Jeg kan ta denne vakten.".to_string(),
        now,
    )?;
    println!(
        "\n5. {} applied ({}), status {}",
        top_worker.0,
        application.id.0,
        application.status.label()
    );

    let outcome = service.approve_application(&application.id, now)?;
    println!(
        "\n6. Approved {}: contract {} created, shift {} is now {}",
        outcome.application.id.0,
        outcome.contract.id.0,
        outcome.shift.id.0,
        outcome.shift.status.label()
    );
    println!(
        "   Active contracts: {} | pending applications: {}",
        marketplace.repository.contracts().len(),
        service.pending_applications(&department.id)?.len()
    );

    Ok(())
}

fn render_ranking(offered_wage: u32, ranked: &[RankedCandidate]) {
    if offered_wage == 0 {
        println!("Offered wage: no preference");
    } else {
        println!("Offered wage: {offered_wage} NOK/h");
    }
    if ranked.is_empty() {
        println!("  No candidates");
        return;
    }

    println!(
        "  {:<4} {:<16} {:>6} {:>6} {:>7} {:>5} {:>6} {:>5} {:>5}  tier",
        "#", "worker", "rate", "rating", "reviews", "wage", "rating", "exp", "total"
    );
    for (index, candidate) in ranked.iter().enumerate() {
        let scored = &candidate.scored;
        let rating = scored
            .candidate
            .average_rating
            .map(|rating| format!("{rating:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<4} {:<16} {:>6} {:>6} {:>7} {:>5} {:>6} {:>5} {:>5}  {}",
            index + 1,
            scored.candidate.worker_id.0,
            scored.candidate.hourly_rate,
            rating,
            scored.candidate.total_reviews,
            scored.wage_fit,
            scored.rating_score,
            scored.experience_score,
            scored.match_score,
            candidate.tier.label()
        );
    }
}
