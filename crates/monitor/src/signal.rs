use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload delivered to presentation code when the warning threshold is crossed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningSignal {
    pub message: String,
    pub remaining_time_ms: u64,
}

impl WarningSignal {
    #[must_use]
    pub fn new(remaining_time_ms: u64) -> Self {
        let secs = remaining_time_ms.div_ceil(1000);
        let message = if secs >= 60 {
            let mins = secs.div_ceil(60);
            format!(
                "You will be signed out in about {mins} minute{} due to inactivity.",
                if mins == 1 { "" } else { "s" }
            )
        } else {
            format!("You will be signed out in {secs} seconds due to inactivity.")
        };
        Self {
            message,
            remaining_time_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    ActivityRecorded { at: DateTime<Utc> },
    Warning(WarningSignal),
    Terminated { at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn Fn(&MonitorEvent) + Send + Sync>;

/// Handlers registered on one monitor, called in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

impl Subscribers {
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&MonitorEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sid, _)| *sid != id);
        self.handlers.len() != before
    }

    pub fn publish(&self, event: &MonitorEvent) {
        for (_, handler) in &self.handlers {
            handler(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers").field("count", &self.handlers.len()).finish()
    }
}
