use crate::activity::ActivityEvent;
use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::diagnostics::{DiagnosticStore, LAST_ACTIVITY_KEY};
use crate::session::{SessionProbe, SessionTerminator};
use crate::signal::{MonitorEvent, Subscribers, SubscriptionId, WarningSignal};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorPhase {
    /// Not attached to a session.
    Inactive,
    /// Session active, no warning pending.
    Tracking,
    /// Warning dispatched, countdown running.
    WarningShown,
    /// Session ended; timers and listeners are gone.
    Terminated,
}

impl MonitorPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MonitorPhase::Inactive => "inactive",
            MonitorPhase::Tracking => "tracking",
            MonitorPhase::WarningShown => "warning_shown",
            MonitorPhase::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Monitor stopped or session inactive.
    Skipped,
    Idle,
    Warned,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub phase: MonitorPhase,
    pub last_activity: DateTime<Utc>,
    pub remaining_time_ms: u64,
    pub warning_shown: bool,
}

/// Tracks user activity for one session and ends the session after it has been
/// idle for `inactivity_timeout`, warning `warning_lead_time` ahead.
///
/// The monitor is driven from outside: interaction events go to
/// [`handle_event`](Self::handle_event) and the host calls
/// [`fire_due_timers`](Self::fire_due_timers) regularly. Nothing here blocks or
/// spawns work.
pub struct InactivityMonitor {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    session: Arc<dyn SessionProbe>,
    terminator: Arc<dyn SessionTerminator>,
    diagnostics: Option<Arc<dyn DiagnosticStore>>,
    subscribers: Subscribers,
    last_activity: DateTime<Utc>,
    warning_shown: bool,
    phase: MonitorPhase,
    listening: bool,
    next_poll: Option<DateTime<Utc>>,
}

impl InactivityMonitor {
    pub fn new(
        config: MonitorConfig,
        session: Arc<dyn SessionProbe>,
        terminator: Arc<dyn SessionTerminator>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            last_activity: clock.now(),
            config,
            clock,
            session,
            terminator,
            diagnostics: None,
            subscribers: Subscribers::default(),
            warning_shown: false,
            phase: MonitorPhase::Inactive,
            listening: false,
            next_poll: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.last_activity = clock.now();
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, store: Arc<dyn DiagnosticStore>) -> Self {
        self.diagnostics = Some(store);
        self
    }

    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Attaches the activity listener and the polling timer.
    ///
    /// Always stops first, so calling it twice never doubles listeners or timers.
    /// Does nothing else when `session_active` is false.
    pub fn start(&mut self, session_active: bool) {
        self.stop();
        if !session_active {
            debug!("Inactivity monitor not started: session inactive");
            return;
        }

        let now = self.clock.now();
        self.listening = true;
        self.phase = MonitorPhase::Tracking;
        self.next_poll = Some(now.checked_add_signed(self.config.poll_interval()).unwrap_or(now));

        info!(
            "Inactivity monitor started (timeout: {} ms, warning lead: {} ms, poll: {} ms)",
            self.config.inactivity_timeout_ms, self.config.warning_lead_time_ms, self.config.poll_interval_ms
        );

        self.record_activity();
    }

    /// Cancels the polling timer and detaches the listener. No callback fires after
    /// this returns.
    pub fn stop(&mut self) {
        let was_running = self.is_running();
        self.tear_down();
        if was_running {
            self.phase = MonitorPhase::Inactive;
            debug!("Inactivity monitor stopped");
        }
    }

    /// The authentication layer reports that the session is over.
    pub fn session_ended(&mut self) {
        self.tear_down();
        if self.phase != MonitorPhase::Inactive {
            self.phase = MonitorPhase::Terminated;
        }
        debug!("Session ended externally");
    }

    /// Listener entry point. Returns whether the event counted as activity.
    pub fn handle_event(&mut self, event: ActivityEvent) -> bool {
        if !self.listening || !self.config.listens_to(event) {
            return false;
        }
        self.record_activity();
        true
    }

    pub fn record_activity(&mut self) {
        let now = self.clock.now();
        self.last_activity = now;
        self.warning_shown = false;
        if self.phase == MonitorPhase::WarningShown {
            self.phase = MonitorPhase::Tracking;
        }

        if let Some(store) = &self.diagnostics {
            if let Err(e) = store.put(LAST_ACTIVITY_KEY, &now.to_rfc3339()) {
                warn!("Failed to persist last activity timestamp: {}", e);
            }
        }

        self.subscribers.publish(&MonitorEvent::ActivityRecorded { at: now });
    }

    /// Timer entry point. Runs [`poll`](Self::poll) once if the polling timer is due
    /// and schedules the next tick on the interval grid after now. Missed ticks are
    /// not replayed.
    pub fn fire_due_timers(&mut self) -> Option<PollOutcome> {
        let due = self.next_poll?;
        let now = self.clock.now();
        if now < due {
            return None;
        }

        let interval_ms = self.config.poll_interval().num_milliseconds().max(1);
        let behind_ms = (now - due).num_milliseconds();
        let ticks = behind_ms / interval_ms + 1;
        // Out-of-range schedules fall back to polling on the next call.
        let next = ticks
            .checked_mul(interval_ms)
            .and_then(Duration::try_milliseconds)
            .and_then(|step| due.checked_add_signed(step))
            .unwrap_or(now);
        self.next_poll = Some(next);

        Some(self.poll())
    }

    /// Re-evaluates idle time against both thresholds.
    pub fn poll(&mut self) -> PollOutcome {
        if !self.is_running() || !self.session.is_active() {
            return PollOutcome::Skipped;
        }

        let idle = self.idle_duration();
        let mut outcome = PollOutcome::Idle;

        if idle >= self.config.warning_threshold() && !self.warning_shown {
            self.warning_shown = true;
            self.phase = MonitorPhase::WarningShown;
            let signal = WarningSignal::new(self.remaining_time_ms());
            info!(
                "Inactivity warning: {} ms until automatic logout",
                signal.remaining_time_ms
            );
            self.subscribers.publish(&MonitorEvent::Warning(signal));
            outcome = PollOutcome::Warned;
        }

        if idle >= self.config.inactivity_timeout() {
            info!("Automatic logout triggered after {} ms of inactivity", idle.num_milliseconds());
            self.run_termination();
            outcome = PollOutcome::Terminated;
        }

        outcome
    }

    /// Ends the session right away, as when the user picks "log out now".
    pub fn terminate_now(&mut self) {
        if !self.is_running() {
            return;
        }
        if !self.session.is_active() {
            self.session_ended();
            return;
        }
        info!("Logout requested");
        self.run_termination();
    }

    fn run_termination(&mut self) {
        let now = self.clock.now();
        self.tear_down();
        self.phase = MonitorPhase::Terminated;

        match self.terminator.on_terminate() {
            Ok(()) => debug!("Termination callback executed successfully"),
            Err(e) => warn!("Termination callback failed: {}", e),
        }

        self.subscribers.publish(&MonitorEvent::Terminated { at: now });
    }

    fn tear_down(&mut self) {
        self.listening = false;
        self.next_poll = None;
        self.warning_shown = false;
    }

    #[must_use]
    pub fn idle_duration(&self) -> Duration {
        let idle = self.clock.now() - self.last_activity;
        if idle < Duration::zero() { Duration::zero() } else { idle }
    }

    #[must_use]
    pub fn remaining_time(&self) -> Duration {
        let remaining = self.config.inactivity_timeout() - self.idle_duration();
        if remaining < Duration::zero() {
            Duration::zero()
        } else {
            remaining
        }
    }

    #[must_use]
    pub fn remaining_time_ms(&self) -> u64 {
        u64::try_from(self.remaining_time().num_milliseconds()).unwrap_or(0)
    }

    #[must_use]
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            phase: self.phase,
            last_activity: self.last_activity,
            remaining_time_ms: self.remaining_time_ms(),
            warning_shown: self.warning_shown,
        }
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.phase, MonitorPhase::Tracking | MonitorPhase::WarningShown)
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }

    #[must_use]
    pub const fn phase(&self) -> MonitorPhase {
        self.phase
    }

    #[must_use]
    pub const fn warning_shown(&self) -> bool {
        self.warning_shown
    }

    #[must_use]
    pub const fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[must_use]
    pub const fn next_poll_at(&self) -> Option<DateTime<Utc>> {
        self.next_poll
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl std::fmt::Debug for InactivityMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InactivityMonitor")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("last_activity", &self.last_activity)
            .field("warning_shown", &self.warning_shown)
            .field("listening", &self.listening)
            .field("next_poll", &self.next_poll)
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}
