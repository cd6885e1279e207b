use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

use super::button::ButtonId;

/// Тип распознанного нажатия
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressKind {
    Down,
    Up,
    Short,
    Long,
    Hold,
}

impl fmt::Display for PressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PressKind::Down => "DOWN",
            PressKind::Up => "UP",
            PressKind::Short => "SHORT",
            PressKind::Long => "LONG",
            PressKind::Hold => "HOLD",
        };
        write!(f, "{}", name)
    }
}

/// Событие нажатия, передаваемое обработчику
///
/// `duration` равна нулю для `Down`, для `Up`/`Short`/`Long` это время с момента
/// нажатия, для `Hold` это время удержания на момент срабатывания порога.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PressEvent {
    pub kind: PressKind,
    pub button: ButtonId,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl PressEvent {
    pub fn new(kind: PressKind, button: ButtonId, duration: Duration) -> Self {
        Self {
            kind,
            button,
            duration,
        }
    }

    pub fn down(button: ButtonId) -> Self {
        Self::new(PressKind::Down, button, Duration::ZERO)
    }

    pub fn up(button: ButtonId, duration: Duration) -> Self {
        Self::new(PressKind::Up, button, duration)
    }

    pub fn short(button: ButtonId, duration: Duration) -> Self {
        Self::new(PressKind::Short, button, duration)
    }

    pub fn long(button: ButtonId, duration: Duration) -> Self {
        Self::new(PressKind::Long, button, duration)
    }

    pub fn hold(button: ButtonId, duration: Duration) -> Self {
        Self::new(PressKind::Hold, button, duration)
    }
}

impl fmt::Display for PressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}ms)",
            self.kind,
            self.button,
            self.duration.as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_down_has_zero_duration() {
        let event = PressEvent::down(ButtonId::new(2));
        assert_eq!(event.kind, PressKind::Down);
        assert_eq!(event.duration, Duration::ZERO);
    }

    #[test]
    fn test_press_event_display() {
        let event = PressEvent::long(ButtonId::new(2), Duration::from_millis(600));
        assert_eq!(event.to_string(), "LONG(B2, 600ms)");
    }

    #[test]
    fn test_press_event_serializes_millis() {
        let event = PressEvent::hold(ButtonId::new(4), Duration::from_micros(520_900));
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "hold", "button": 4, "duration_ms": 520})
        );
    }
}
