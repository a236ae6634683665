#![allow(dead_code)]

use netlife_api::models::ActivityRequest;
use netlife_monitor::{ActivityEvent, MonitorConfig};

pub fn scenario_config() -> MonitorConfig {
    MonitorConfig {
        inactivity_timeout_ms: 180_000,
        warning_lead_time_ms: 60_000,
        poll_interval_ms: 10_000,
        activity_events: ActivityEvent::default_set().to_vec(),
    }
}

pub fn keyboard_only_config() -> MonitorConfig {
    MonitorConfig {
        activity_events: vec![ActivityEvent::KeyPress],
        ..scenario_config()
    }
}

pub fn activity(event: &str) -> ActivityRequest {
    ActivityRequest {
        event: event.to_string(),
    }
}
