use crate::config::Config;
use crate::events::{ButtonId, Transition};
use crate::services::press_classifier::{PressClassifier, PressHandler, PressThresholds};
use crate::services::serial_listener::LineDecoder;
use crate::trace_if_enabled;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{self, interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

/// Общая точка входа для потока переходов и периодических тиков.
///
/// Оба источника работают с таблицей состояний только под одной блокировкой,
/// которая удерживается на всё время `handle_transition` или `tick`.
pub struct PressEngine {
    classifier: Mutex<PressClassifier>,
    decoder: LineDecoder,
    tick_interval: Duration,
}

impl PressEngine {
    pub fn new(config: &Config, handler: Box<dyn PressHandler>) -> Self {
        let thresholds = PressThresholds::from_config(&config.timing);
        info!(
            "Инициализация PressEngine: кнопок {}, длинное > {:?}, удержание > {:?}",
            config.panel.button_count, thresholds.long_press, thresholds.hold
        );
        if thresholds.hold <= thresholds.long_press {
            // Допустимо: Hold придёт раньше, чем нажатие станет длинным
            warn!(
                "Порог удержания {:?} не больше границы длинного нажатия {:?}",
                thresholds.hold, thresholds.long_press
            );
        }

        Self {
            classifier: Mutex::new(PressClassifier::new(
                config.panel.button_count,
                thresholds,
                handler,
            )),
            decoder: LineDecoder::new(config.panel.button_count),
            tick_interval: config.timing.tick_interval(),
        }
    }

    /// Декодировать строку и обработать переход; `false` если строка отброшена
    pub fn handle_line(&self, line: &[u8]) -> bool {
        match self.decoder.decode(line) {
            Some(transition) => {
                // Часы tokio: совпадают с системными, но управляемы в тестах
                self.handle_transition(transition, time::Instant::now().into_std());
                true
            }
            None => {
                trace_if_enabled!("Отброшена строка: {:?}", String::from_utf8_lossy(line));
                false
            }
        }
    }

    pub fn handle_transition(&self, transition: Transition, now: Instant) {
        trace_if_enabled!("Переход: {}", transition);
        self.classifier.lock().handle_transition(transition, now);
    }

    pub fn tick(&self, now: Instant) {
        self.classifier.lock().tick(now);
    }

    #[allow(dead_code)]
    pub fn is_down(&self, button: ButtonId) -> bool {
        self.classifier.lock().is_down(button)
    }

    /// Периодическая проверка удержаний, независимая от чтения порта
    pub async fn run_ticker(self: Arc<Self>) {
        let thresholds = self.classifier.lock().thresholds();
        info!(
            "Тикер удержаний запущен: период {:?}, порог {:?}",
            self.tick_interval, thresholds.hold
        );

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let now = ticker.tick().await;
            self.tick(now.into_std());
        }
    }
}
