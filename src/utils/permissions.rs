use crate::error::{PanelError, Result};
use crate::panel_error;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Проверить доступ к последовательному порту перед открытием
pub fn check_port_access(port: &str) -> Result<()> {
    info!("Проверка прав доступа к {}...", port);

    // Имена вроде COM3 не являются путями - проверять нечего
    if !port.starts_with('/') {
        info!("Порт {} не является путём, проверка пропущена", port);
        return Ok(());
    }

    let path = Path::new(port);
    if !path.exists() {
        return PanelError::port_not_found(format!("{} не существует", port));
    }

    check_port_rw(path)?;

    // Проверка, что не запущен от root (рекомендация безопасности)
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_port_rw(path: &Path) -> Result<()> {
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            for hint in get_setup_commands() {
                warn!("{}", hint);
            }
            Err(panel_error!(
                permission,
                "Нет прав чтения/записи {} ({}). Добавьте пользователя в группу 'dialout'",
                path.display(),
                describe_mode(path)
            ))
        }
        Err(e) => {
            // Занятость порта и прочее сообщит уже открытие через tokio-serial
            warn!("Пробное открытие {} не удалось: {}", path.display(), e);
            Ok(())
        }
    }
}

#[cfg(unix)]
fn describe_mode(path: &Path) -> String {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| format!("mode {:o}", m.permissions().mode() & 0o777))
        .unwrap_or_else(|_| "mode неизвестен".to_string())
}

#[cfg(not(unix))]
fn describe_mode(_path: &Path) -> String {
    "mode неизвестен".to_string()
}

fn check_not_root() {
    // Проверяем переменную окружения USER
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Рекомендуется добавить пользователя в группу 'dialout'");
            warn!("   и запускать приложение от имени обычного пользователя");
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

/// Получить рекомендуемые команды для настройки прав доступа
pub fn get_setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в группу последовательных портов:".to_string(),
        "sudo usermod -a -G dialout $USER".to_string(),
        "".to_string(),
        "# Или правило udev для панели:".to_string(),
        "echo 'SUBSYSTEM==\"tty\", MODE=\"0660\", GROUP=\"dialout\"' | sudo tee /etc/udev/rules.d/99-pcpanel.rules".to_string(),
        "".to_string(),
        "# После выполнения команд перезайдите в систему".to_string(),
    ]
}
