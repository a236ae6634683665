use chrono::{DateTime, Duration, Utc};
use netlife_monitor::{
    ActivityEvent, Clock, CountdownAction, DiagnosticStore, InactivityMonitor, MonitorConfig, MonitorEvent,
    MonitorPhase, SessionFlag, SystemClock, WarningCountdown,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Session,
    SignedOut,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusType {
    Info,
    Success,
    Warning,
    Error,
}

pub struct App {
    pub monitor: InactivityMonitor,
    pub session: SessionFlag,
    pub countdown: WarningCountdown,
    pub screen: Screen,

    pub activity_count: u64,
    pub last_event: Option<ActivityEvent>,
    pub signed_in_at: DateTime<Utc>,
    pub signed_out_at: Option<DateTime<Utc>>,

    pub status_message: Option<String>,
    pub status_type: StatusType,

    inbox: Arc<Mutex<VecDeque<MonitorEvent>>>,
    countdown_tick_at: Option<DateTime<Utc>>,
}

impl App {
    /// Creates the app on the system clock and signs the session in.
    #[must_use]
    pub fn new(config: MonitorConfig, diagnostics: Option<Arc<dyn DiagnosticStore>>) -> Self {
        Self::with_clock(config, Arc::new(SystemClock), diagnostics)
    }

    #[must_use]
    pub fn with_clock(
        config: MonitorConfig,
        clock: Arc<dyn Clock>,
        diagnostics: Option<Arc<dyn DiagnosticStore>>,
    ) -> Self {
        let session = SessionFlag::new(false);

        // Signing out here only flips the flag; the screen change follows the
        // Terminated event.
        let on_terminate = session.clone();
        let mut monitor = InactivityMonitor::new(
            config,
            Arc::new(session.clone()),
            Arc::new(move || on_terminate.set_active(false)),
        )
        .with_clock(clock);
        if let Some(store) = diagnostics {
            monitor = monitor.with_diagnostics(store);
        }

        let inbox = Arc::new(Mutex::new(VecDeque::new()));
        let sink = Arc::clone(&inbox);
        monitor.subscribe(move |event| {
            if let Ok(mut queue) = sink.lock() {
                queue.push_back(event.clone());
            }
        });

        let signed_in_at = monitor.now();
        let mut app = Self {
            monitor,
            session,
            countdown: WarningCountdown::new(),
            screen: Screen::Session,
            activity_count: 0,
            last_event: None,
            signed_in_at,
            signed_out_at: None,
            status_message: None,
            status_type: StatusType::Info,
            inbox,
            countdown_tick_at: None,
        };
        app.sign_in();
        app
    }

    pub fn sign_in(&mut self) {
        self.session.set_active(true);
        self.monitor.start(true);
        self.drain_events();
        self.screen = Screen::Session;
        self.signed_in_at = self.monitor.now();
        self.signed_out_at = None;
        self.activity_count = 0;
        self.last_event = None;
        self.set_status("Signed in. Session ends after inactivity.".to_string(), StatusType::Success);
    }

    /// Routes an interaction to the monitor. Returns whether it counted as activity.
    pub fn on_input(&mut self, event: ActivityEvent) -> bool {
        if self.screen != Screen::Session || self.countdown.is_visible() {
            return false;
        }
        let counted = self.monitor.handle_event(event);
        if counted {
            self.activity_count += 1;
            self.last_event = Some(event);
        }
        self.drain_events();
        counted
    }

    /// Runs due timers and advances the warning countdown. Call often.
    pub fn tick(&mut self) {
        self.monitor.fire_due_timers();
        self.drain_events();

        if !self.countdown.is_visible() {
            self.countdown_tick_at = None;
            return;
        }

        let now = self.monitor.now();
        let mut next = self.countdown_tick_at.unwrap_or(now + Duration::seconds(1));
        while self.countdown.is_visible() && now >= next {
            let action = self.countdown.tick(self.session.get());
            self.apply(action);
            next += Duration::seconds(1);
        }
        self.countdown_tick_at = self.countdown.is_visible().then_some(next);
    }

    pub fn stay_logged_in(&mut self) {
        let action = self.countdown.stay_logged_in();
        self.apply(action);
        if action == CountdownAction::RecordActivity {
            self.set_status("Still here. Session extended.".to_string(), StatusType::Success);
        }
    }

    pub fn logout_now(&mut self) {
        let action = self.countdown.logout_now();
        self.apply(action);
        self.note_requested_sign_out();
    }

    /// Explicit sign-out from the session screen.
    pub fn sign_out(&mut self) {
        self.countdown.dismiss();
        self.monitor.terminate_now();
        self.drain_events();
        self.note_requested_sign_out();
    }

    fn note_requested_sign_out(&mut self) {
        if self.screen == Screen::SignedOut {
            self.set_status("Signed out.".to_string(), StatusType::Info);
        }
    }

    fn apply(&mut self, action: CountdownAction) {
        match action {
            CountdownAction::None => {}
            CountdownAction::RecordActivity => self.monitor.record_activity(),
            CountdownAction::Terminate => self.monitor.terminate_now(),
        }
        self.drain_events();
    }

    fn drain_events(&mut self) {
        let events: Vec<MonitorEvent> = match self.inbox.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => return,
        };

        for event in events {
            match event {
                MonitorEvent::Warning(signal) => {
                    self.countdown.show(&signal);
                    self.countdown_tick_at = None;
                    self.set_status(signal.message.clone(), StatusType::Warning);
                }
                MonitorEvent::ActivityRecorded { .. } => {
                    self.countdown.dismiss();
                }
                MonitorEvent::Terminated { at } => {
                    self.countdown.dismiss();
                    self.screen = Screen::SignedOut;
                    self.signed_out_at = Some(at);
                    self.set_status("Signed out due to inactivity.".to_string(), StatusType::Error);
                }
            }
        }
    }

    pub fn set_status(&mut self, message: String, status_type: StatusType) {
        self.status_message = Some(message);
        self.status_type = status_type;
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    #[must_use]
    pub fn phase(&self) -> MonitorPhase {
        self.monitor.phase()
    }

    /// Fraction of the timeout still left, for the gauge.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn remaining_ratio(&self) -> f64 {
        let total = self.monitor.config().inactivity_timeout_ms.max(1) as f64;
        (self.monitor.remaining_time_ms() as f64 / total).clamp(0.0, 1.0)
    }
}
