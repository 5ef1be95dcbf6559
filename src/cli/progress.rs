// src/cli/progress.rs — Terminal progress renderer for generation feedback

use crate::core::types::ProgressEvent;

/// One stderr line per event.
pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::AttemptStarted {
            unit,
            attempt,
            max_attempts,
        } => format!("[{unit}] attempt {attempt}/{max_attempts}..."),
        ProgressEvent::AttemptFailed {
            unit,
            attempt,
            error,
            will_retry,
        } => {
            let next = if *will_retry { "retrying" } else { "giving up" };
            format!(
                "[{unit}] attempt {attempt} failed: {} ({next})",
                crate::util::truncate_str(error, 120)
            )
        }
        ProgressEvent::UnitCompleted {
            unit,
            attempts,
            model,
            stage,
        } => format!("[{unit}] done in {attempts} attempt(s) via {model} ({stage})"),
        ProgressEvent::DayReady {
            day,
            stops,
            day_total,
            spent_so_far,
        } => format!(
            "[day {day}] {stops} stop(s), {day_total}원 (running total {spent_so_far}원)"
        ),
    }
}

/// Build a progress callback that writes formatted output to stderr.
///
/// All progress output goes to stderr so stdout remains clean JSON.
pub fn terminal_progress() -> impl Fn(ProgressEvent) + Send + Sync + 'static {
    move |event| eprintln!("{}", format_event(&event))
}
