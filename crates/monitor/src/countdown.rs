//! Headless state for the inactivity warning dialog.
//!
//! Presentation code owns rendering; this type owns what the dialog shows and
//! what the host must do in response to it.

use crate::signal::WarningSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownAction {
    None,
    /// The user chose to stay: record activity on the monitor.
    RecordActivity,
    /// Countdown expired or the user chose to leave: end the session.
    Terminate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarningCountdown {
    visible: bool,
    remaining_secs: u64,
    message: String,
}

impl WarningCountdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, signal: &WarningSignal) {
        self.visible = true;
        self.remaining_secs = signal.remaining_time_ms.div_ceil(1000);
        self.message.clone_from(&signal.message);
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self, session_active: bool) -> CountdownAction {
        if !self.visible {
            return CountdownAction::None;
        }
        if !session_active {
            self.dismiss();
            return CountdownAction::None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.dismiss();
            return CountdownAction::Terminate;
        }
        CountdownAction::None
    }

    pub fn stay_logged_in(&mut self) -> CountdownAction {
        if !self.visible {
            return CountdownAction::None;
        }
        self.dismiss();
        CountdownAction::RecordActivity
    }

    pub fn logout_now(&mut self) -> CountdownAction {
        if !self.visible {
            return CountdownAction::None;
        }
        self.dismiss();
        CountdownAction::Terminate
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
        self.remaining_secs = 0;
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub const fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `m:ss` rendering of the remaining time.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
