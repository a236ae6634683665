use crate::activity::ActivityEvent;
use crate::monitor::{InactivityMonitor, MonitorSnapshot, PollOutcome};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration as TokioDuration, MissedTickBehavior, interval};
use tracing::{debug, info};

/// Drives an [`InactivityMonitor`]'s polling timer from a tokio task.
pub struct MonitorService {
    monitor: Arc<Mutex<InactivityMonitor>>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl MonitorService {
    #[must_use]
    pub fn new(monitor: InactivityMonitor) -> Self {
        Self {
            monitor: Arc::new(Mutex::new(monitor)),
            task: std::sync::Mutex::new(None),
        }
    }

    #[must_use]
    pub fn monitor(&self) -> Arc<Mutex<InactivityMonitor>> {
        Arc::clone(&self.monitor)
    }

    /// Starts the monitor and its timer task, replacing any previous task.
    pub async fn start(&self, session_active: bool) {
        self.abort_task();

        let tick_period = {
            let mut monitor = self.monitor.lock().await;
            monitor.start(session_active);
            if !monitor.is_running() {
                return;
            }
            let poll_ms = monitor.config().poll_interval_ms.clamp(1, 1_000);
            TokioDuration::from_millis(poll_ms)
        };

        let monitor = Arc::clone(&self.monitor);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(tick_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!("Inactivity monitor service started");

            loop {
                ticker.tick().await;
                let mut monitor = monitor.lock().await;
                if let Some(PollOutcome::Terminated) = monitor.fire_due_timers() {
                    debug!("Session terminated by inactivity monitor");
                }
                if !monitor.is_running() {
                    break;
                }
            }

            info!("Inactivity monitor service stopped");
        });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    pub async fn stop(&self) {
        self.abort_task();
        self.monitor.lock().await.stop();
    }

    pub async fn session_ended(&self) {
        self.abort_task();
        self.monitor.lock().await.session_ended();
    }

    pub async fn record_activity(&self) {
        self.monitor.lock().await.record_activity();
    }

    pub async fn handle_event(&self, event: ActivityEvent) -> bool {
        self.monitor.lock().await.handle_event(event)
    }

    pub async fn terminate_now(&self) {
        self.abort_task();
        self.monitor.lock().await.terminate_now();
    }

    pub async fn get_time_until_logout(&self) -> chrono::Duration {
        self.monitor.lock().await.remaining_time()
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        self.monitor.lock().await.snapshot()
    }

    /// Whether the timer task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    fn abort_task(&self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        self.abort_task();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::config::MonitorConfig;
    use crate::monitor::MonitorPhase;
    use crate::session::SessionFlag;
    use crate::signal::MonitorEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            inactivity_timeout_ms: 300,
            warning_lead_time_ms: 200,
            poll_interval_ms: 20,
            ..MonitorConfig::default()
        }
    }

    fn service_with_counter() -> (MonitorService, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let terminations = Arc::new(AtomicUsize::new(0));
        let warnings = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&terminations);
        let mut monitor = InactivityMonitor::new(
            fast_config(),
            Arc::new(SessionFlag::new(true)),
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let seen = Arc::clone(&warnings);
        monitor.subscribe(move |event| {
            if matches!(event, MonitorEvent::Warning(_)) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        });
        (MonitorService::new(monitor), terminations, warnings)
    }

    #[tokio::test]
    async fn test_service_terminates_idle_session_once() {
        let (service, terminations, warnings) = service_with_counter();
        service.start(true).await;
        assert!(service.is_running());

        tokio::time::sleep(TokioDuration::from_millis(600)).await;

        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert_eq!(warnings.load(Ordering::SeqCst), 1);
        assert_eq!(service.snapshot().await.phase, MonitorPhase::Terminated);
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_termination() {
        let (service, terminations, _) = service_with_counter();
        service.start(true).await;
        service.stop().await;

        tokio::time::sleep(TokioDuration::from_millis(500)).await;
        assert_eq!(terminations.load(Ordering::SeqCst), 0);
        assert!(!service.is_running());
        assert_eq!(service.snapshot().await.phase, MonitorPhase::Inactive);
    }

    #[tokio::test]
    async fn test_restart_replaces_the_timer_task() {
        let (service, terminations, _) = service_with_counter();
        service.start(true).await;
        service.start(true).await;

        tokio::time::sleep(TokioDuration::from_millis(600)).await;
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_with_inactive_session_spawns_nothing() {
        let (service, _, _) = service_with_counter();
        service.start(false).await;
        assert!(!service.is_running());
        assert!(!service.handle_event(ActivityEvent::Click).await);
    }
}
