use std::io::Write;

use chime_core::context::{SchedulerConfig, SchedulerConfigExt};
use chime_core::timers::{RepeatLimit, TimerHandle};
use tracing::info;

use crate::app_state::AppContext;

/// Job run by every shell timer: print the timer's message
fn announce(args: &[String], timer: &TimerHandle<String>) {
    let message = args.first().map(String::as_str).unwrap_or("");
    println!("\n[timer {}] {}", timer.id(), message);
    info!(
        timer_id = timer.id(),
        remaining = timer.repeat_limit(),
        "Timer fired"
    );
}

pub fn schedule_once(ctx: &AppContext, secs: f64, message: String) -> Result<(), String> {
    let timer = ctx
        .scheduler
        .schedule_once(secs, vec![message], announce)
        .map_err(|e| e.to_string())?;
    println!("timer {} fires in {secs}s", timer.id());
    Ok(())
}

/// `times` of zero (the default) repeats until stopped
pub fn schedule_every(
    ctx: &AppContext,
    secs: f64,
    times: i64,
    message: String,
) -> Result<(), String> {
    let timer = ctx
        .scheduler
        .schedule_repeating(secs, RepeatLimit::from(times), vec![message], announce)
        .map_err(|e| e.to_string())?;
    println!(
        "timer {} fires every {secs}s ({})",
        timer.id(),
        describe_limit(timer.repeat_limit())
    );
    Ok(())
}

pub fn stop(ctx: &AppContext, id: u64) -> Result<(), String> {
    let timer = ctx
        .scheduler
        .find(id)
        .ok_or_else(|| format!("no timer with id {id}"))?;
    timer.stop();
    println!("timer {id} stopped");
    Ok(())
}

pub fn list_timers(ctx: &AppContext) {
    let timers = ctx.scheduler.timers();
    if timers.is_empty() {
        println!("No timers scheduled");
        return;
    }

    let now = ctx.scheduler.now();
    println!(
        "{:<8} {:<12} {:<12} {:<12} {}",
        "Id", "Interval", "Remaining", "Next", "Message"
    );
    println!("{}", "-".repeat(64));

    for timer in &timers {
        let message = timer.job().args().first().cloned().unwrap_or_default();
        let next = if timer.is_finished() {
            "stopped".to_string()
        } else {
            format!("{:.2}s", (timer.next_fire_time() - now).max(0.0))
        };
        println!(
            "{:<8} {:<12} {:<12} {:<12} {}",
            timer.id(),
            format!("{:.3}s", timer.interval()),
            describe_limit(timer.repeat_limit()),
            next,
            message
        );
    }

    println!("\nTotal: {} timers", timers.len());
}

/// Sweep once by hand (useful while paused)
pub fn tick(ctx: &AppContext) {
    let report = ctx.scheduler.tick();
    println!(
        "due: {}, dispatched: {}, rejected: {}, pruned: {}, remaining: {}",
        report.due, report.dispatched, report.rejected, report.pruned, report.remaining
    );
}

pub async fn pause(ctx: &AppContext) {
    if ctx.pause().await {
        println!("tick driver paused");
    } else {
        println!("tick driver already paused");
    }
}

pub async fn resume(ctx: &AppContext) {
    if ctx.resume().await {
        println!("tick driver resumed");
    } else {
        println!("tick driver already running");
    }
}

pub async fn show_stats(ctx: &AppContext) {
    let timers = ctx.scheduler.timers();
    let unbounded = timers.iter().filter(|t| t.is_unbounded()).count();
    let stopped = timers.iter().filter(|t| t.is_finished()).count();

    println!("clock: {:.3}s", ctx.scheduler.now());
    println!("driver running: {}", ctx.is_running().await);
    println!("dispatcher: {}", ctx.scheduler.registry().dispatcher().name());
    println!("timers: {} ({unbounded} unbounded, {stopped} awaiting prune)", timers.len());
}

pub async fn show_settings(ctx: &AppContext) {
    let config = ctx.config.read().await;
    match SchedulerConfig::config_path() {
        Ok(path) => println!("config file: {}", path.display()),
        Err(e) => println!("config file: unavailable ({e})"),
    }
    println!("tick interval: {}ms", config.tick_interval_ms);
    println!("dispatcher: {}", config.dispatcher.label());
    println!("worker threads: {}", config.worker_threads);
    println!("idle timeout: {}s", config.idle_timeout_secs);
    println!("debug logging: {}", config.logging.debug);
}

/// Persist the current config via confy
pub async fn save_settings(ctx: &AppContext) -> Result<(), String> {
    let config = ctx.config.read().await;
    config.save().map_err(|e| e.to_string())?;
    println!("configuration saved");
    Ok(())
}

pub async fn exit(ctx: &AppContext) -> Result<(), String> {
    let stopped = ctx.shutdown().await;
    writeln!(std::io::stdout(), "stopped {stopped} timers, quitting...")
        .map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())
}

fn describe_limit(limit: i64) -> String {
    match limit {
        l if l < 0 => "forever".to_string(),
        0 => "done".to_string(),
        1 => "1 left".to_string(),
        l => format!("{l} left"),
    }
}
