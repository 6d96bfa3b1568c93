use std::sync::Arc;

use tm_config_watcher::start_server;
use tm_config_watcher::ConfigWatcher;
use tm_config_watcher::KubeConfigMapSource;
use tm_config_watcher::LogConfig;
use tm_config_watcher::Result;
use tm_config_watcher::Settings;
use tm_config_watcher::Watcher;
use tm_config_watcher::LOG_FILE_NAME;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let settings = Settings::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&settings.log);

    // Initializing Shutdown Signal
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = graceful_shutdown(shutdown).await {
                error!("Failed to shutdown: {:?}", e);
            }
        }
    });

    let source = KubeConfigMapSource::try_default(settings.watcher.event_buffer_size).await?;
    let watcher = Arc::new(ConfigWatcher::new(settings.watcher.namespace.clone(), source));

    if settings.http.enabled {
        let addr = settings.http.listen_addr;
        let reader: Arc<dyn Watcher> = watcher.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(addr, reader, shutdown).await {
                error!("HTTP server stopped: {:?}", e);
            }
        });
    }

    info!(
        "Watching ConfigMap in namespace {}. Waiting for CTRL+C signal...",
        watcher.namespace()
    );
    let result = watcher.run(shutdown.clone()).await;
    if let Err(e) = &result {
        error!("watcher stops: {}", e);
    }
    // Stop the HTTP server too when the watcher fails on its own.
    shutdown.cancel();

    result
}

async fn graceful_shutdown(shutdown: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
        _ = shutdown.cancelled() => {
            return Ok(());
        },
    }

    info!("Shutdown watcher..");
    shutdown.cancel();
    Ok(())
}

pub fn init_observability(config: &LogConfig) -> WorkerGuard {
    let (non_blocking, guard) = if config.log_to_file {
        tracing_appender::non_blocking(tracing_appender::rolling::never(
            &config.log_dir,
            LOG_FILE_NAME,
        ))
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();

    guard
}
