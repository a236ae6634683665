pub mod activity;
pub mod clock;
pub mod config;
pub mod countdown;
pub mod diagnostics;
pub mod monitor;
pub mod service;
pub mod session;
pub mod signal;

// Re-export commonly used types for easier access
pub use activity::{ActivityEvent, UnknownActivityEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, MAX_TIMEOUT_MS, MonitorConfig};
pub use countdown::{CountdownAction, WarningCountdown};
pub use diagnostics::{
    DiagnosticError, DiagnosticStore, FileDiagnosticStore, LAST_ACTIVITY_KEY, MemoryDiagnosticStore,
    NoopDiagnosticStore,
};
pub use monitor::{InactivityMonitor, MonitorPhase, MonitorSnapshot, PollOutcome};
pub use service::MonitorService;
pub use session::{SessionFlag, SessionProbe, SessionTerminator, TerminateError};
pub use signal::{MonitorEvent, SubscriptionId, WarningSignal};
