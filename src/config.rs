use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::events::{ButtonId, PressKind};

/// Максимум кнопок: номер передаётся одной цифрой
pub const MAX_BUTTONS: u8 = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub serial: SerialConfig,
    pub panel: PanelConfig,
    pub timing: TimingConfig,
    pub bindings: Vec<Binding>,
    // Индекс привязок - не сериализуется, строится после загрузки
    #[serde(skip)]
    binding_index: HashMap<(ButtonId, PressKind), Vec<usize>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PanelConfig {
    pub button_count: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Граница между коротким и длинным нажатием
    pub long_press_ms: u64,
    /// Порог удержания
    pub hold_ms: u64,
    /// Период проверки удержания
    pub tick_interval_ms: u64,
}

/// Привязка внешней команды к нажатию
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Binding {
    pub button: ButtonId,
    pub press: PressKind,
    pub command: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 9600,
            read_buffer_size: 32,
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { button_count: 4 }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 400,
            hold_ms: 500,
            tick_interval_ms: 40,
        }
    }
}

impl TimingConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig::default(),
            serial: SerialConfig::default(),
            panel: PanelConfig::default(),
            timing: TimingConfig::default(),
            bindings: Vec::new(),
            binding_index: HashMap::new(),
        };
        config.build_binding_index();
        config
    }
}

impl Config {
    /// Ошибки загрузки и валидации возвращаются как `PanelError::Config`
    pub fn load<P: AsRef<Path>>(config_path: P) -> crate::error::Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PCPANEL_").split("__"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_binding_index();

        Ok(config)
    }

    /// Строит индекс привязок по паре (кнопка, тип нажатия)
    pub fn build_binding_index(&mut self) {
        self.binding_index.clear();
        for (i, binding) in self.bindings.iter().enumerate() {
            self.binding_index
                .entry((binding.button, binding.press))
                .or_default()
                .push(i);
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация порта
        if self.serial.port.trim().is_empty() {
            anyhow::bail!("serial.port не может быть пустым");
        }

        if self.serial.baud_rate == 0 {
            anyhow::bail!("baud_rate должно быть больше 0");
        }

        if self.serial.read_buffer_size < 4 {
            anyhow::bail!("read_buffer_size должно быть минимум 4");
        }

        // Валидация панели
        if self.panel.button_count == 0 || self.panel.button_count > MAX_BUTTONS {
            anyhow::bail!(
                "button_count должно быть от 1 до {}, получено {}",
                MAX_BUTTONS,
                self.panel.button_count
            );
        }

        // Валидация порогов
        if self.timing.long_press_ms == 0 {
            anyhow::bail!("long_press_ms должно быть больше 0");
        }

        if self.timing.hold_ms == 0 {
            anyhow::bail!("hold_ms должно быть больше 0");
        }

        if self.timing.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms должно быть больше 0");
        }

        // Валидация привязок
        for (i, binding) in self.bindings.iter().enumerate() {
            if binding.button.value() == 0 || binding.button.value() > self.panel.button_count {
                anyhow::bail!(
                    "Неверная кнопка {} в привязке #{} (доступно 1..={})",
                    binding.button.value(),
                    i + 1,
                    self.panel.button_count
                );
            }

            match binding.command.first() {
                Some(program) if !program.trim().is_empty() => {}
                _ => anyhow::bail!("Пустая команда в привязке #{}", i + 1),
            }
        }

        Ok(())
    }

    /// Привязки для конкретного нажатия (O(1) поиск по индексу)
    pub fn bindings_for(&self, button: ButtonId, kind: PressKind) -> impl Iterator<Item = &Binding> + '_ {
        self.binding_index
            .get(&(button, kind))
            .into_iter()
            .flatten()
            .map(move |&i| &self.bindings[i])
    }
}
