// src/cli/plan.rs — `tripkoi plan`: generate and emit itinerary JSON

use std::path::{Path, PathBuf};

use super::PlanArgs;
use crate::api::types::{DayResponse, RemainingResponse, TripHeader};
use crate::core::orchestrator::Orchestrator;
use crate::core::trip::{TripContext, TripRequest};
use crate::infra::config::Config;
use crate::infra::paths;

/// Run one generation request from the command line.
pub async fn run_plan(args: PlanArgs, config: &Config) -> anyhow::Result<()> {
    let ctx = TripContext::from_request(&TripRequest {
        city: args.city.clone(),
        start_date: args.start.clone(),
        end_date: args.end.clone(),
        people: args.people.clone(),
        budget: args.budget.clone(),
    })?;

    let mut orchestrator = Orchestrator::from_config(config)?;
    if !args.quiet {
        orchestrator = orchestrator.with_progress(super::progress::terminal_progress());
        eprintln!(
            "[plan] {} | {} day(s), {} person(s), {}원 per person | {}",
            ctx.city, ctx.days, ctx.people, ctx.budget_per_person, ctx.currency.code
        );
    }

    let json = if let Some(day) = args.day {
        let generated = orchestrator.generate_day(&ctx, day).await?;
        serde_json::to_string_pretty(&DayResponse {
            trip: TripHeader::from(&ctx),
            generated,
        })?
    } else if args.remaining {
        let day_plans = orchestrator.generate_remaining(&ctx).await?;
        serde_json::to_string_pretty(&RemainingResponse {
            trip: TripHeader::from(&ctx),
            day_plans,
        })?
    } else if args.progressive {
        serde_json::to_string_pretty(&orchestrator.generate_progressive(&ctx).await?)?
    } else {
        serde_json::to_string_pretty(&orchestrator.generate_itinerary(&ctx).await?)?
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &json)?;
            if !args.quiet {
                eprintln!("[done] written to {}", path.display());
            }
        }
        None => println!("{json}"),
    }

    if args.save {
        let path = save_copy(&paths::itineraries_dir(), &ctx, &json)?;
        if !args.quiet {
            eprintln!("[done] saved to {}", path.display());
        }
    }

    Ok(())
}

/// Write `json` under `dir` with a name derived from the trip.
fn save_copy(dir: &Path, ctx: &TripContext, json: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(ctx, chrono::Local::now().format("%Y%m%d%H%M%S")));
    std::fs::write(&path, json)?;
    tracing::debug!("Itinerary saved to {}", path.display());
    Ok(path)
}

fn file_name(ctx: &TripContext, stamp: impl std::fmt::Display) -> String {
    let city: String = ctx
        .city
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("{city}_{}_{stamp}.json", ctx.start_date)
}
