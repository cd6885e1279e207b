use crate::config::{Binding, Config};
use crate::debug_if_enabled;
use crate::events::PressEvent;
use crate::services::press_classifier::PressHandler;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Создать обработчик нажатий и канал для `ActionDispatcher`.
///
/// Обработчик вызывается под блокировкой классификатора, поэтому он только
/// пересылает событие в канал и никогда не блокируется.
pub fn press_channel() -> (Box<dyn PressHandler>, mpsc::UnboundedReceiver<PressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler = move |event: PressEvent| {
        if tx.send(event).is_err() {
            debug_if_enabled!("ActionDispatcher остановлен, событие {} потеряно", event);
        }
    };
    (Box::new(handler), rx)
}

/// Выполняет внешние команды, привязанные к нажатиям
pub struct ActionDispatcher {
    config: Arc<Config>,
    dry_run: bool,
}

impl ActionDispatcher {
    pub fn new(config: Arc<Config>, dry_run: bool) -> Self {
        info!(
            "Инициализация ActionDispatcher: {} привязок (dry_run: {})",
            config.bindings.len(),
            dry_run
        );
        Self { config, dry_run }
    }

    pub async fn run(self, mut rx: mpsc::UnboundedReceiver<PressEvent>) {
        while let Some(event) = rx.recv().await {
            self.dispatch(&event);
        }
        info!("ActionDispatcher завершил работу");
    }

    /// Запустить все команды для события; возвращает число найденных привязок
    pub fn dispatch(&self, event: &PressEvent) -> usize {
        info!("Нажатие: {}", event);

        let mut count = 0;
        for binding in self.config.bindings_for(event.button, event.kind) {
            count += 1;
            if self.dry_run {
                info!("[DRY RUN] Команда для {}: {:?}", event, binding.command);
                continue;
            }
            Self::spawn_command(binding, event);
        }

        if count == 0 {
            debug_if_enabled!("Нет привязок для {} {}", event.button, event.kind);
        }
        count
    }

    fn spawn_command(binding: &Binding, event: &PressEvent) {
        let Some((program, args)) = binding.command.split_first() else {
            return;
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .env("PCPANEL_BUTTON", event.button.value().to_string())
            .env("PCPANEL_PRESS", event.kind.to_string())
            .env("PCPANEL_DURATION_MS", event.duration.as_millis().to_string());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Не удалось запустить '{}': {}", program, e);
                return;
            }
        };

        debug_if_enabled!("Запущена команда {:?} для {}", binding.command, event);

        // Дожидаемся завершения отдельно, чтобы не задерживать следующие события
        let program = program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("Команда '{}' завершилась с кодом {}", program, status),
                Err(e) => error!("Ошибка ожидания команды '{}': {}", program, e),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ButtonId, PressKind};
    use std::time::Duration;

    fn create_config() -> Arc<Config> {
        let mut config = Config::default();
        config.bindings = vec![
            Binding {
                button: ButtonId::new(2),
                press: PressKind::Short,
                command: vec!["true".to_string()],
            },
            Binding {
                button: ButtonId::new(4),
                press: PressKind::Hold,
                command: vec!["true".to_string()],
            },
        ];
        config.build_binding_index();
        Arc::new(config)
    }

    #[test]
    fn test_dispatch_matches_bindings_in_dry_run() {
        let dispatcher = ActionDispatcher::new(create_config(), true);

        let short = PressEvent::short(ButtonId::new(2), Duration::from_millis(80));
        let long = PressEvent::long(ButtonId::new(2), Duration::from_millis(800));
        let hold = PressEvent::hold(ButtonId::new(4), Duration::from_millis(520));

        assert_eq!(dispatcher.dispatch(&short), 1);
        assert_eq!(dispatcher.dispatch(&long), 0);
        assert_eq!(dispatcher.dispatch(&hold), 1);
    }

    #[tokio::test]
    async fn test_press_channel_feeds_dispatcher() {
        let (mut handler, rx) = press_channel();
        let dispatcher = ActionDispatcher::new(create_config(), true);

        handler.on_press(PressEvent::down(ButtonId::new(2)));
        handler.on_press(PressEvent::short(ButtonId::new(2), Duration::from_millis(50)));
        drop(handler);

        // Канал закрыт - run завершается после обработки всех событий
        tokio::time::timeout(Duration::from_secs(1), dispatcher.run(rx))
            .await
            .expect("dispatcher должен завершиться после закрытия канала");
    }

    #[test]
    fn test_handler_survives_closed_channel() {
        let (mut handler, rx) = press_channel();
        drop(rx);
        handler.on_press(PressEvent::down(ButtonId::new(1)));
    }

    #[tokio::test]
    async fn test_dispatch_spawns_real_command() {
        let dispatcher = ActionDispatcher::new(create_config(), false);
        let hold = PressEvent::hold(ButtonId::new(4), Duration::from_millis(520));
        assert_eq!(dispatcher.dispatch(&hold), 1);
    }
}
