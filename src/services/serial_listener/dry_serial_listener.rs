use crate::config::Config;
use crate::error::Result;
use crate::events::{ButtonId, Edge, Transition};
use crate::services::PressEngine;
use std::sync::Arc;
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, info, warn};

use super::line_decoder::LineDecoder;
use super::r#trait::SerialListenerTrait;

/// Сценарий эмуляции: (кнопка, сколько держать)
const SCRIPT: [(u8, u64); 4] = [(1, 120), (2, 650), (3, 900), (4, 80)];

pub struct DryRunSerialListener {
    config: Arc<Config>,
    engine: Arc<PressEngine>,
}

impl DryRunSerialListener {
    pub fn new(config: Arc<Config>, engine: Arc<PressEngine>) -> Result<Self> {
        info!("Инициализация DryRunSerialListener");
        Ok(Self { config, engine })
    }

    /// Отправить строку протокола тем же путём, что и реальный порт
    fn feed(&self, button: ButtonId, edge: Edge) {
        let Some(line) = LineDecoder::encode(Transition::new(button, edge)) else {
            warn!("Dry-run: кнопку {} нельзя закодировать одной цифрой", button);
            return;
        };
        debug!("Dry-run: строка {:?}", line);
        self.engine.handle_line(line.as_bytes());
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - SerialListener работает в режиме эмуляции");

        // Начальное состояние панели: все кнопки отпущены
        for id in 1..=self.config.panel.button_count {
            self.feed(ButtonId::new(id), Edge::Up);
        }

        let mut interval = interval(Duration::from_secs(5));
        loop {
            interval.tick().await;

            for (id, hold_ms) in SCRIPT {
                if id > self.config.panel.button_count {
                    continue;
                }
                let button = ButtonId::new(id);
                info!("Dry-run: эмулируем нажатие {} на {}мс", button, hold_ms);

                self.feed(button, Edge::Down);
                sleep(Duration::from_millis(hold_ms)).await;
                self.feed(button, Edge::Up);
                sleep(Duration::from_millis(200)).await;
            }
        }
    }
}

#[async_trait::async_trait]
impl SerialListenerTrait for DryRunSerialListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
