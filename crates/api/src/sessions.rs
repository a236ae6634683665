use netlife_monitor::{
    ActivityEvent, Clock, InactivityMonitor, MonitorConfig, MonitorEvent, MonitorPhase, MonitorSnapshot, SessionFlag,
    WarningSignal,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One tracked client session.
pub struct SessionEntry {
    monitor: InactivityMonitor,
    flag: SessionFlag,
    pending_warning: Arc<Mutex<Option<WarningSignal>>>,
}

impl SessionEntry {
    #[must_use]
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.monitor.snapshot()
    }

    /// The warning raised since the last recorded activity, if any.
    #[must_use]
    pub fn pending_warning(&self) -> Option<WarningSignal> {
        self.pending_warning.lock().ok().and_then(|w| w.clone())
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flag.get()
    }
}

pub enum ActivityOutcome {
    Recorded { counted: bool, remaining_time_ms: u64 },
    Ended,
}

/// Live sessions allowed before creation is refused.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Every live session and its inactivity monitor.
pub struct SessionRegistry {
    config: MonitorConfig,
    clock: Arc<dyn Clock>,
    sessions: HashMap<Uuid, SessionEntry>,
    max_sessions: usize,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: MonitorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            sessions: HashMap::new(),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn set_max_sessions(&mut self, max: usize) {
        self.max_sessions = max;
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Opens a session. Returns `None` when the registry is still full after
    /// expired sessions are swept.
    pub fn create(&mut self) -> Option<(Uuid, MonitorSnapshot)> {
        if self.sessions.len() >= self.max_sessions {
            self.sweep();
            if self.sessions.len() >= self.max_sessions {
                warn!("Refusing new session: {} live session(s) at the limit", self.sessions.len());
                return None;
            }
        }

        let id = Uuid::new_v4();
        let flag = SessionFlag::new(true);

        let terminated_flag = flag.clone();
        let mut monitor = InactivityMonitor::new(
            self.config.clone(),
            Arc::new(flag.clone()),
            Arc::new(move || {
                terminated_flag.set_active(false);
                info!("Session {} signed out after inactivity", id);
            }),
        )
        .with_clock(Arc::clone(&self.clock));

        let pending_warning = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&pending_warning);
        monitor.subscribe(move |event| {
            if let Ok(mut pending) = slot.lock() {
                match event {
                    MonitorEvent::Warning(signal) => *pending = Some(signal.clone()),
                    MonitorEvent::ActivityRecorded { .. } | MonitorEvent::Terminated { .. } => *pending = None,
                }
            }
        });

        monitor.start(true);
        let snapshot = monitor.snapshot();
        self.sessions.insert(
            id,
            SessionEntry {
                monitor,
                flag,
                pending_warning,
            },
        );
        debug!("Session {} created", id);
        Some((id, snapshot))
    }

    /// Brings one session's timers up to date and returns it. Terminated sessions
    /// are reported once and then forgotten.
    pub fn refresh(&mut self, id: &Uuid) -> Option<(MonitorSnapshot, Option<WarningSignal>)> {
        let entry = self.sessions.get_mut(id)?;
        entry.monitor.fire_due_timers();
        let snapshot = entry.snapshot();
        let warning = entry.pending_warning();
        if snapshot.phase == MonitorPhase::Terminated {
            self.sessions.remove(id);
        }
        Some((snapshot, warning))
    }

    pub fn record_event(&mut self, id: &Uuid, event: ActivityEvent) -> Option<ActivityOutcome> {
        let entry = self.sessions.get_mut(id)?;
        entry.monitor.fire_due_timers();
        if !entry.monitor.is_running() {
            return Some(ActivityOutcome::Ended);
        }
        let counted = entry.monitor.handle_event(event);
        Some(ActivityOutcome::Recorded {
            counted,
            remaining_time_ms: entry.monitor.remaining_time_ms(),
        })
    }

    /// Ends a session on request. Returns false for unknown ids.
    pub fn logout(&mut self, id: &Uuid) -> bool {
        let Some(mut entry) = self.sessions.remove(id) else {
            return false;
        };
        entry.monitor.terminate_now();
        entry.flag.set_active(false);
        true
    }

    /// Fires due timers on every session and drops the terminated ones.
    pub fn sweep(&mut self) -> usize {
        for entry in self.sessions.values_mut() {
            entry.monitor.fire_due_timers();
        }
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| entry.monitor.phase() != MonitorPhase::Terminated);
        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!("Swept {} terminated session(s)", removed);
        }
        removed
    }

    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<&SessionEntry> {
        self.sessions.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::Duration;
    use netlife_monitor::ManualClock;

    fn registry() -> (SessionRegistry, ManualClock) {
        let clock = ManualClock::at_epoch();
        (
            SessionRegistry::new(MonitorConfig::default(), Arc::new(clock.clone())),
            clock,
        )
    }

    #[test]
    fn test_sweep_drops_only_expired_sessions() {
        let (mut registry, clock) = registry();
        let (stale, _) = registry.create().unwrap();
        clock.advance(Duration::milliseconds(100_000));
        let (fresh, _) = registry.create().unwrap();

        clock.advance(Duration::milliseconds(90_000));
        assert_eq!(registry.sweep(), 1);
        assert!(registry.get(&stale).is_none());
        assert!(registry.get(&fresh).is_some());
    }

    #[test]
    fn test_warning_is_pending_until_activity() {
        let (mut registry, clock) = registry();
        let (id, _) = registry.create().unwrap();

        clock.advance(Duration::milliseconds(130_000));
        let (snapshot, warning) = registry.refresh(&id).unwrap();
        assert_eq!(snapshot.phase, MonitorPhase::WarningShown);
        assert_eq!(warning.unwrap().remaining_time_ms, 50_000);

        let outcome = registry.record_event(&id, ActivityEvent::Click).unwrap();
        assert!(matches!(outcome, ActivityOutcome::Recorded { counted: true, remaining_time_ms: 180_000 }));
        assert!(registry.get(&id).unwrap().pending_warning().is_none());
    }

    #[test]
    fn test_terminated_session_reported_once() {
        let (mut registry, clock) = registry();
        let (id, _) = registry.create().unwrap();

        clock.advance(Duration::milliseconds(181_000));
        let (snapshot, _) = registry.refresh(&id).unwrap();
        assert_eq!(snapshot.phase, MonitorPhase::Terminated);
        assert!(registry.refresh(&id).is_none());
    }

    #[test]
    fn test_create_refuses_beyond_limit_until_sessions_expire() {
        let (mut registry, clock) = registry();
        registry.set_max_sessions(2);
        registry.create().unwrap();
        clock.advance(Duration::milliseconds(100_000));
        let (fresh, _) = registry.create().unwrap();

        assert!(registry.create().is_none());
        assert_eq!(registry.len(), 2);

        clock.advance(Duration::milliseconds(90_000));
        let (replacement, _) = registry.create().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get(&fresh).is_some());
        assert!(registry.get(&replacement).is_some());
    }

    #[test]
    fn test_logout_marks_session_inactive() {
        let (mut registry, _clock) = registry();
        let (id, _) = registry.create().unwrap();
        assert!(registry.get(&id).unwrap().is_active());

        assert!(registry.logout(&id));
        assert!(!registry.logout(&id));
        assert!(registry.is_empty());
    }
}
