use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::{debug_if_enabled, panel_error};
use crate::services::PressEngine;
use crate::utils::permissions;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{error, info, warn};

use super::r#trait::SerialListenerTrait;

/// Итог чтения одной записи из порта
#[derive(Debug, PartialEq, Eq)]
enum Record {
    Line,
    /// Запись длиннее лимита, отброшена целиком вместе с хвостом
    Overlong,
    Eof,
}

/// Прочитать запись до `\n`, не накапливая больше `limit` байт.
async fn read_record<R>(reader: &mut R, line: &mut Vec<u8>, limit: usize) -> std::io::Result<Record>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let read = (&mut *reader).take(limit as u64).read_until(b'\n', line).await?;
    if read == 0 {
        return Ok(Record::Eof);
    }
    if read < limit || line.last() == Some(&b'\n') {
        return Ok(Record::Line);
    }

    // Шум без перевода строки: пропускаем до конца записи порциями по limit
    loop {
        line.clear();
        let read = (&mut *reader).take(limit as u64).read_until(b'\n', line).await?;
        if read == 0 || line.last() == Some(&b'\n') {
            break;
        }
    }
    line.clear();
    Ok(Record::Overlong)
}

pub struct RealSerialListener {
    config: Arc<Config>,
    engine: Arc<PressEngine>,
    port: SerialStream,
}

impl RealSerialListener {
    pub fn new(config: Arc<Config>, engine: Arc<PressEngine>) -> Result<Self> {
        info!("Инициализация RealSerialListener");

        let path = config.serial.port.as_str();
        permissions::check_port_access(path)?;

        let port = tokio_serial::new(path, config.serial.baud_rate)
            .open_native_async()
            .map_err(|e| {
                Self::log_open_error(path, &e);
                PanelError::Serial(e)
            })?;

        info!(
            "Порт {} открыт ({} бод, буфер {} байт)",
            path, config.serial.baud_rate, config.serial.read_buffer_size
        );

        Ok(Self {
            config,
            engine,
            port,
        })
    }

    async fn run_impl(self) -> Result<()> {
        let path = self.config.serial.port.clone();
        info!("RealSerialListener запущен, начинаем чтение {}", path);

        let limit = self.config.serial.read_buffer_size;
        let mut reader = BufReader::with_capacity(limit, self.port);
        let mut line = Vec::with_capacity(limit);
        let mut accepted: u64 = 0;
        let mut dropped: u64 = 0;

        loop {
            // Ошибка транспорта фатальна - решение о перезапуске принимает владелец
            let record = read_record(&mut reader, &mut line, limit)
                .await
                .map_err(|e| {
                    error!("Ошибка чтения из {}: {}", path, e);
                    PanelError::Io(e)
                })?;

            match record {
                Record::Line => {}
                Record::Overlong => {
                    debug_if_enabled!("Отброшена запись длиннее {} байт", limit);
                    dropped += 1;
                    continue;
                }
                Record::Eof => {
                    warn!(
                        "Порт {} закрыт (принято {}, отброшено {} строк)",
                        path, accepted, dropped
                    );
                    return Err(panel_error!(disconnected, "порт {} вернул EOF", path));
                }
            }

            if self.engine.handle_line(&line) {
                accepted += 1;
            } else {
                dropped += 1;
            }
        }
    }

    fn log_open_error(path: &str, e: &tokio_serial::Error) {
        warn!("Не удалось открыть порт {}: {}", path, e);
        warn!("Проверьте:");
        warn!("1. Панель подключена и порт указан верно (serial.port или --port)");
        warn!("2. Порт не занят другим процессом");
        for hint in permissions::get_setup_commands() {
            warn!("   {}", hint);
        }
    }
}

#[async_trait::async_trait]
impl SerialListenerTrait for RealSerialListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
