use serde::{Deserialize, Serialize};
use std::fmt;

/// Interaction event kinds that can count as user activity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityEvent {
    PointerDown,
    PointerMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
    Focus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActivityEvent(pub String);

impl fmt::Display for UnknownActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown activity event '{}'", self.0)
    }
}

impl std::error::Error for UnknownActivityEvent {}

impl std::str::FromStr for ActivityEvent {
    type Err = UnknownActivityEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let event = match s.trim().to_lowercase().as_str() {
            "pointer_down" | "pointerdown" | "mousedown" | "mouse_down" => ActivityEvent::PointerDown,
            "pointer_move" | "pointermove" | "mousemove" | "mouse_move" => ActivityEvent::PointerMove,
            "key_press" | "keypress" | "keydown" | "key_down" => ActivityEvent::KeyPress,
            "scroll" | "wheel" => ActivityEvent::Scroll,
            "touch_start" | "touchstart" => ActivityEvent::TouchStart,
            "click" | "tap" => ActivityEvent::Click,
            "focus" => ActivityEvent::Focus,
            other => return Err(UnknownActivityEvent(other.to_string())),
        };
        Ok(event)
    }
}

impl ActivityEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActivityEvent::PointerDown => "pointer_down",
            ActivityEvent::PointerMove => "pointer_move",
            ActivityEvent::KeyPress => "key_press",
            ActivityEvent::Scroll => "scroll",
            ActivityEvent::TouchStart => "touch_start",
            ActivityEvent::Click => "click",
            ActivityEvent::Focus => "focus",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [ActivityEvent] {
        &[
            ActivityEvent::PointerDown,
            ActivityEvent::PointerMove,
            ActivityEvent::KeyPress,
            ActivityEvent::Scroll,
            ActivityEvent::TouchStart,
            ActivityEvent::Click,
            ActivityEvent::Focus,
        ]
    }

    /// The event set a session listens to unless configured otherwise. Excludes `Focus`.
    #[must_use]
    pub const fn default_set() -> &'static [ActivityEvent] {
        &[
            ActivityEvent::PointerDown,
            ActivityEvent::PointerMove,
            ActivityEvent::KeyPress,
            ActivityEvent::Scroll,
            ActivityEvent::TouchStart,
            ActivityEvent::Click,
        ]
    }
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
