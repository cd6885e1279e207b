use crate::config::TimingConfig;
use crate::debug_if_enabled;
use crate::events::{ButtonId, Edge, PressEvent, Transition};
use std::time::{Duration, Instant};
use tracing::warn;

/// Получатель распознанных нажатий
pub trait PressHandler: Send {
    fn on_press(&mut self, event: PressEvent);
}

impl<F> PressHandler for F
where
    F: FnMut(PressEvent) + Send,
{
    fn on_press(&mut self, event: PressEvent) {
        self(event)
    }
}

/// Пороги классификации
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressThresholds {
    /// Отпускание позже этого порога - длинное нажатие
    pub long_press: Duration,
    /// Удержание дольше этого порога - событие Hold
    pub hold: Duration,
}

impl PressThresholds {
    pub fn from_config(timing: &TimingConfig) -> Self {
        Self {
            long_press: timing.long_press(),
            hold: timing.hold(),
        }
    }
}

/// Состояние одной кнопки
#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    down_since: Option<Instant>,
    hold_reported: bool,
}

/// Машина состояний нажатий: переходы и тики превращаются в события
pub struct PressClassifier {
    states: Vec<ButtonState>,
    thresholds: PressThresholds,
    handler: Box<dyn PressHandler>,
}

impl PressClassifier {
    pub fn new(button_count: u8, thresholds: PressThresholds, handler: Box<dyn PressHandler>) -> Self {
        Self {
            states: vec![ButtonState::default(); button_count as usize],
            thresholds,
            handler,
        }
    }

    pub fn handle_transition(&mut self, transition: Transition, now: Instant) {
        let button = transition.button;
        let Some(slot) = button.index().filter(|&i| i < self.states.len()) else {
            warn!("Переход для неизвестной кнопки {} проигнорирован", button);
            return;
        };

        match transition.edge {
            Edge::Down => {
                self.emit(PressEvent::down(button));
                let state = &mut self.states[slot];
                state.down_since = Some(now);
                state.hold_reported = false;
            }
            Edge::Up => {
                let state = &mut self.states[slot];
                // Отпускание без нажатия - начальное состояние устройства
                let Some(since) = state.down_since.take() else {
                    debug_if_enabled!("Отпускание {} без нажатия - пропускаем", button);
                    return;
                };
                state.hold_reported = false;

                let length = now.saturating_duration_since(since);
                self.emit(PressEvent::up(button, length));
                if length > self.thresholds.long_press {
                    self.emit(PressEvent::long(button, length));
                } else {
                    self.emit(PressEvent::short(button, length));
                }
            }
        }
    }

    pub fn tick(&mut self, now: Instant) {
        for slot in 0..self.states.len() {
            let state = &mut self.states[slot];
            if state.hold_reported {
                continue;
            }
            let Some(since) = state.down_since else {
                continue;
            };

            let held = now.saturating_duration_since(since);
            if held > self.thresholds.hold {
                state.hold_reported = true;
                self.emit(PressEvent::hold(ButtonId::from_index(slot as u8), held));
            }
        }
    }

    pub fn is_down(&self, button: ButtonId) -> bool {
        button
            .index()
            .and_then(|i| self.states.get(i))
            .is_some_and(|state| state.down_since.is_some())
    }

    pub fn thresholds(&self) -> PressThresholds {
        self.thresholds
    }

    fn emit(&mut self, event: PressEvent) {
        debug_if_enabled!("Событие нажатия: {}", event);
        self.handler.on_press(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PressKind;
    use std::sync::mpsc;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn create_classifier() -> (PressClassifier, mpsc::Receiver<PressEvent>) {
        let thresholds = PressThresholds {
            long_press: ms(400),
            hold: ms(500),
        };
        let (tx, rx) = mpsc::channel();
        let handler = move |event: PressEvent| {
            let _ = tx.send(event);
        };
        (PressClassifier::new(4, thresholds, Box::new(handler)), rx)
    }

    fn drain(rx: &mpsc::Receiver<PressEvent>) -> Vec<PressEvent> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_short_press() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b1 = ButtonId::new(1);

        classifier.handle_transition(Transition::down(b1), t0);
        classifier.handle_transition(Transition::up(b1), t0 + ms(100));

        assert_eq!(
            drain(&rx),
            vec![
                PressEvent::down(b1),
                PressEvent::up(b1, ms(100)),
                PressEvent::short(b1, ms(100)),
            ]
        );
        assert!(!classifier.is_down(b1));
    }

    #[test]
    fn test_boundary_press_is_short() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b1 = ButtonId::new(1);

        classifier.handle_transition(Transition::down(b1), t0);
        classifier.handle_transition(Transition::up(b1), t0 + ms(400));

        let events = drain(&rx);
        assert_eq!(events[2], PressEvent::short(b1, ms(400)));
    }

    #[test]
    fn test_long_press() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b3 = ButtonId::new(3);

        classifier.handle_transition(Transition::down(b3), t0);
        classifier.handle_transition(Transition::up(b3), t0 + ms(450));

        assert_eq!(
            drain(&rx),
            vec![
                PressEvent::down(b3),
                PressEvent::up(b3, ms(450)),
                PressEvent::long(b3, ms(450)),
            ]
        );
    }

    #[test]
    fn test_spurious_up_is_ignored() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b2 = ButtonId::new(2);

        classifier.handle_transition(Transition::up(b2), t0);
        classifier.handle_transition(Transition::up(b2), t0 + ms(10));
        classifier.tick(t0 + ms(1000));

        assert!(drain(&rx).is_empty());
        assert!(!classifier.is_down(b2));
    }

    #[test]
    fn test_hold_threshold() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b1 = ButtonId::new(1);

        classifier.handle_transition(Transition::down(b1), t0);
        drain(&rx);

        classifier.tick(t0 + ms(499));
        classifier.tick(t0 + ms(500));
        assert!(drain(&rx).is_empty());

        classifier.tick(t0 + ms(501));
        assert_eq!(drain(&rx), vec![PressEvent::hold(b1, ms(501))]);

        // Hold срабатывает один раз за нажатие
        classifier.tick(t0 + ms(540));
        classifier.tick(t0 + ms(2000));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_hold_then_long_scenario() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b2 = ButtonId::new(2);

        classifier.handle_transition(Transition::down(b2), t0);
        classifier.tick(t0 + ms(450));
        classifier.tick(t0 + ms(520));
        classifier.handle_transition(Transition::up(b2), t0 + ms(600));

        assert_eq!(
            drain(&rx),
            vec![
                PressEvent::down(b2),
                PressEvent::hold(b2, ms(520)),
                PressEvent::up(b2, ms(600)),
                PressEvent::long(b2, ms(600)),
            ]
        );
    }

    #[test]
    fn test_new_down_resets_hold() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b4 = ButtonId::new(4);

        classifier.handle_transition(Transition::down(b4), t0);
        classifier.tick(t0 + ms(600));
        classifier.handle_transition(Transition::up(b4), t0 + ms(700));
        drain(&rx);

        let t1 = t0 + ms(1000);
        classifier.handle_transition(Transition::down(b4), t1);
        classifier.tick(t1 + ms(499));
        assert_eq!(drain(&rx), vec![PressEvent::down(b4)]);

        classifier.tick(t1 + ms(501));
        assert_eq!(drain(&rx), vec![PressEvent::hold(b4, ms(501))]);
    }

    #[test]
    fn test_repeated_down_restarts_episode() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b1 = ButtonId::new(1);

        classifier.handle_transition(Transition::down(b1), t0);
        classifier.handle_transition(Transition::down(b1), t0 + ms(300));
        classifier.handle_transition(Transition::up(b1), t0 + ms(400));

        let events = drain(&rx);
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], PressEvent::up(b1, ms(100)));
        assert_eq!(events[3], PressEvent::short(b1, ms(100)));
    }

    #[test]
    fn test_buttons_are_independent() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();
        let b1 = ButtonId::new(1);
        let b2 = ButtonId::new(2);

        classifier.handle_transition(Transition::down(b1), t0);
        classifier.handle_transition(Transition::down(b2), t0 + ms(300));
        drain(&rx);

        classifier.tick(t0 + ms(600));
        assert_eq!(drain(&rx), vec![PressEvent::hold(b1, ms(600))]);

        classifier.tick(t0 + ms(900));
        assert_eq!(drain(&rx), vec![PressEvent::hold(b2, ms(600))]);
    }

    #[test]
    fn test_unknown_button_is_ignored() {
        let (mut classifier, rx) = create_classifier();
        let t0 = Instant::now();

        classifier.handle_transition(Transition::down(ButtonId::new(5)), t0);
        classifier.handle_transition(Transition::down(ButtonId::new(0)), t0);

        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_hold_before_long_boundary() {
        let thresholds = PressThresholds {
            long_press: ms(800),
            hold: ms(300),
        };
        let (tx, rx) = mpsc::channel();
        let handler = move |event: PressEvent| {
            let _ = tx.send(event);
        };
        let mut classifier = PressClassifier::new(1, thresholds, Box::new(handler));
        let t0 = Instant::now();
        let b1 = ButtonId::new(1);

        classifier.handle_transition(Transition::down(b1), t0);
        classifier.tick(t0 + ms(320));
        classifier.handle_transition(Transition::up(b1), t0 + ms(500));

        let kinds: Vec<_> = drain(&rx).into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![PressKind::Down, PressKind::Hold, PressKind::Up, PressKind::Short]
        );
    }
}
