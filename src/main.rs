use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{create_serial_listener, press_channel, ActionDispatcher, PressEngine};

#[derive(Parser, Debug)]
#[command(name = "pcpanel-rust")]
#[command(about = "Распознавание нажатий кнопочной панели на последовательном порту")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "pcpanel.toml")]
    config: String,

    /// Последовательный порт (переопределяет serial.port)
    #[arg(short, long)]
    port: Option<String>,

    /// Режим сухого запуска (эмуляция панели, команды не запускаются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию logging.level из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    if let Some(port) = &args.port {
        config.serial.port = port.clone();
    }

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск PC Panel v{}", env!("CARGO_PKG_VERSION"));
    if Path::new(&args.config).exists() {
        info!("Конфигурация загружена из: {}", args.config);
    } else {
        warn!("Файл {} не найден - используются значения по умолчанию", args.config);
    }

    if args.dry_run {
        warn!("Режим сухого запуска - панель эмулируется, команды не запускаются");
    }

    let config = Arc::new(config);

    // Инициализация компонентов: обработчик нажатий пересылает события диспетчеру
    let (handler, press_rx) = press_channel();
    let engine = Arc::new(PressEngine::new(&config, handler));
    let dispatcher = ActionDispatcher::new(config.clone(), args.dry_run);
    let serial_listener = create_serial_listener(config.clone(), engine.clone(), args.dry_run)?;

    info!("Все компоненты инициализированы");

    // Чтение порта и тикер удержаний - независимые задачи над общим состоянием
    let mut listener_handle = tokio::spawn(async move { serial_listener.run().await });
    let ticker_handle = tokio::spawn(engine.clone().run_ticker());
    let dispatcher_handle = tokio::spawn(dispatcher.run(press_rx));

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения или отказа транспорта
    let mut listener_joined = false;
    let outcome = tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
            Ok(())
        }
        joined = &mut listener_handle => {
            listener_joined = true;
            match joined {
                Ok(Ok(())) => {
                    warn!("SerialListener завершился без ошибки");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("Ошибка в SerialListener: {}", e);
                    Err(anyhow::Error::new(e).context("Отказ транспорта панели"))
                }
                Err(e) => {
                    error!("Задача SerialListener аварийно завершилась: {}", e);
                    Err(panel_error!(internal, "задача SerialListener: {}", e).into())
                }
            }
        }
    };

    info!("Завершение работы...");

    // Прерываем задачи; новые переходы и тики больше не поступают
    listener_handle.abort();
    ticker_handle.abort();
    dispatcher_handle.abort();

    // Ожидаем завершения задач (с таймаутом)
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        if !listener_joined {
            let _ = listener_handle.await;
        }
        let _ = ticker_handle.await;
        let _ = dispatcher_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("PC Panel завершил работу");
    outcome
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "full" => registry.with(fmt::layer()).init(),
        _ => registry.with(fmt::layer().compact()).init(),
    }

    Ok(())
}
