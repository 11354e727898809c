use std::process::ExitCode;

use scene_loader::{
    run_app, run_headless, AppError, InputAction, InputSnapshot, LoopConfig, LoopSummary,
    SystemClock,
};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;

pub(crate) fn run(mut app: AppWiring) -> ExitCode {
    let press_at_tick = app.press_at_tick;
    let mut next_tick = 0u64;
    let mut input = move |_tick: u64| {
        let snapshot = scripted_input(press_at_tick, next_tick);
        next_tick = next_tick.saturating_add(1);
        snapshot
    };
    let mut clock = SystemClock;

    let allow_at_tick = app.allow_at_tick.map(|tick| tick.max(1));
    let first_leg = LoopConfig {
        max_ticks: first_leg_limit(allow_at_tick, app.loop_config.max_ticks),
        ..app.loop_config.clone()
    };
    let result = run_app(
        &first_leg,
        &mut app.screen,
        &mut app.service,
        &mut clock,
        &mut input,
    )
    .map(|first| match allow_at_tick {
        Some(allow_at)
            if first.ticks == allow_at
                && app.screen.is_loading()
                && app.loop_config.max_ticks.map_or(true, |max| max > allow_at) =>
        {
            let allowed = app.screen.allow_completion();
            info!(tick = allow_at, allowed, "demo_allow_completion");
            let rest = LoopConfig {
                max_ticks: app
                    .loop_config
                    .max_ticks
                    .map(|max| max.saturating_sub(allow_at)),
                ..app.loop_config.clone()
            };
            let second = run_headless(&rest, &mut app.screen, &mut clock, &mut input);
            combine(first, second)
        }
        _ => first,
    });

    report(result, &app)
}

/// The first leg stops at `--allow-at-tick` unless the overall limit is
/// reached first or at the same tick.
fn first_leg_limit(allow_at_tick: Option<u64>, max_ticks: Option<u64>) -> Option<u64> {
    match (allow_at_tick, max_ticks) {
        (Some(allow_at), Some(max)) if max <= allow_at => Some(max),
        (Some(allow_at), _) => Some(allow_at),
        (None, max) => max,
    }
}

fn combine(first: LoopSummary, second: LoopSummary) -> LoopSummary {
    LoopSummary {
        frames: first.frames.saturating_add(second.frames),
        ticks: first.ticks.saturating_add(second.ticks),
        elapsed: first.elapsed.saturating_add(second.elapsed),
        fully_completed: second.fully_completed,
    }
}

fn report(result: Result<LoopSummary, AppError>, app: &AppWiring) -> ExitCode {
    match result {
        Ok(summary) if summary.fully_completed => {
            info!(
                ticks = summary.ticks,
                elapsed_ms = summary.elapsed.as_millis() as u64,
                "demo_finished"
            );
            ExitCode::SUCCESS
        }
        Ok(summary) => {
            warn!(
                ticks = summary.ticks,
                phase = ?app.screen.phase(),
                "demo_stopped_before_completion"
            );
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(error = %err, "demo_failed");
            ExitCode::FAILURE
        }
    }
}

/// Simulates a player pressing Submit once, on `press_at_tick`.
fn scripted_input(press_at_tick: Option<u64>, tick: u64) -> InputSnapshot {
    if press_at_tick == Some(tick) {
        InputSnapshot::empty()
            .with_any_key_pressed(true)
            .with_action_pressed(InputAction::Submit)
    } else {
        InputSnapshot::empty()
    }
}
