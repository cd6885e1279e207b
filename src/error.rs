use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка последовательного порта: {0}")]
    Serial(#[from] tokio_serial::Error),

    #[error("Порт не найден: {0}")]
    PortNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Устройство отключено: {0}")]
    Disconnected(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl PanelError {
    pub fn port_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(PanelError::PortNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, PanelError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! panel_error {
    (port_not_found, $($arg:tt)*) => {
        $crate::error::PanelError::PortNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::PanelError::Permission(format!($($arg)*))
    };
    (disconnected, $($arg:tt)*) => {
        $crate::error::PanelError::Disconnected(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::PanelError::Internal(format!($($arg)*))
    };
}
