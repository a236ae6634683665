use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use color_eyre::eyre::eyre;
use netlife_monitor::{ActivityEvent, Clock, InactivityMonitor, ManualClock, MonitorConfig, MonitorEvent, SessionFlag};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Activity,
    Warning,
    Terminated,
}

/// One monitor event, stamped with simulated milliseconds since start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub at_ms: i64,
    pub kind: TimelineKind,
    pub remaining_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn offset(origin: DateTime<Utc>, ms: u64) -> Result<DateTime<Utc>> {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|d| origin.checked_add_signed(d))
        .ok_or_else(|| eyre!("{ms} ms is out of range"))
}

fn elapsed_ms(origin: DateTime<Utc>, at: DateTime<Utc>) -> i64 {
    (at - origin).num_milliseconds()
}

/// Runs a monitor on a simulated clock from 0 to `until_ms`, injecting a click at
/// each `activity_at` offset, and returns every event it published.
///
/// The clock jumps straight to the next activity or poll, so long runs are cheap.
/// Activity scheduled at the same instant as a poll is recorded first.
///
/// # Errors
/// Returns an error if the configuration is invalid or an offset overflows.
pub fn simulate(config: MonitorConfig, until_ms: u64, activity_at: &[u64]) -> Result<Vec<TimelineEntry>> {
    config.validate()?;

    let clock = ManualClock::at_epoch();
    let origin = clock.now();
    let until = offset(origin, until_ms)?;

    let timeout_ms = config.inactivity_timeout_ms;
    let session = SessionFlag::new(true);
    let on_terminate = session.clone();
    let mut monitor = InactivityMonitor::new(
        config,
        Arc::new(session),
        Arc::new(move || on_terminate.set_active(false)),
    )
    .with_clock(Arc::new(clock.clone()));

    let timeline = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&timeline);
    let event_clock = clock.clone();
    monitor.subscribe(move |event| {
        let entry = match event {
            MonitorEvent::ActivityRecorded { at } => TimelineEntry {
                at_ms: elapsed_ms(origin, *at),
                kind: TimelineKind::Activity,
                remaining_time_ms: timeout_ms,
                message: None,
            },
            MonitorEvent::Warning(signal) => TimelineEntry {
                at_ms: elapsed_ms(origin, event_clock.now()),
                kind: TimelineKind::Warning,
                remaining_time_ms: signal.remaining_time_ms,
                message: Some(signal.message.clone()),
            },
            MonitorEvent::Terminated { at } => TimelineEntry {
                at_ms: elapsed_ms(origin, *at),
                kind: TimelineKind::Terminated,
                remaining_time_ms: 0,
                message: None,
            },
        };
        if let Ok(mut entries) = sink.lock() {
            entries.push(entry);
        }
    });

    let mut activity: Vec<u64> = activity_at.iter().copied().filter(|ms| *ms <= until_ms).collect();
    activity.sort_unstable();
    let mut pending = activity
        .into_iter()
        .map(|ms| offset(origin, ms))
        .collect::<Result<VecDeque<_>>>()?;

    monitor.start(true);

    loop {
        let next_activity = pending.front().copied();
        let next_poll = monitor.next_poll_at();
        let target = [next_activity, next_poll, Some(until)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(until);
        clock.set(target);

        while pending.front().is_some_and(|at| *at <= target) {
            pending.pop_front();
            monitor.handle_event(ActivityEvent::Click);
        }
        monitor.fire_due_timers();

        if target >= until {
            break;
        }
    }

    let entries = timeline.lock().map_err(|_| eyre!("timeline lock poisoned"))?.clone();
    Ok(entries)
}

pub fn print_timeline(entries: &[TimelineEntry]) {
    println!("{:>10}  {:<11} {:>12}", "at (ms)", "event", "remaining");
    for entry in entries {
        let kind = match entry.kind {
            TimelineKind::Activity => "activity",
            TimelineKind::Warning => "warning",
            TimelineKind::Terminated => "terminated",
        };
        println!("{:>10}  {:<11} {:>9} ms", entry.at_ms, kind, entry.remaining_time_ms);
        if let Some(message) = &entry.message {
            println!("{:>10}  └ {message}", "");
        }
    }
}
