use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_server::config::{AppConfig, StorageMode};
use todo_server::{AppState, InMemoryTodoRepository, PostgresTodoRepository, TodoRepository};

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    let config = AppConfig::from_env();

    let default_filter = config
        .as_ref()
        .map_or("todo_server=debug,tower_http=debug", AppConfig::default_log_filter);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(error) = dotenv {
        if error.not_found() {
            tracing::warn!("No .env file found");
        } else {
            tracing::warn!(%error, "Failed to load .env file");
        }
    }

    let config = match config {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "Configuration error");
            std::process::exit(1);
        }
    };

    tracing::info!(
        environment = ?config.environment,
        storage_mode = ?config.storage_mode,
        data_dir = %config.data_dir.display(),
        data_path = %config.data_path.display(),
        "Configuration loaded"
    );

    let repository: Arc<dyn TodoRepository> = match config.storage_mode {
        StorageMode::Postgres => Arc::new(connect_postgres(&config).await),
        StorageMode::InMemory => {
            tracing::warn!("Using in-memory storage; todos are lost on restart");
            Arc::new(InMemoryTodoRepository::new())
        }
    };

    let application = todo_server::app(AppState::new(repository), config.request_timeout);

    let address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, %address, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%address, "Starting server");
    if let Err(error) = todo_server::run(listener, application, shutdown_signal()).await {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }
    tracing::info!("Server shutdown complete");
}

async fn connect_postgres(config: &AppConfig) -> PostgresTodoRepository {
    let database = &config.database;
    tracing::info!(
        host = %database.host,
        port = database.port,
        user = %database.user,
        name = %database.name,
        "Connecting to database"
    );

    let repository = match PostgresTodoRepository::connect(database).await {
        Ok(repository) => repository,
        Err(error) => {
            tracing::error!(%error, "Failed to connect to database");
            std::process::exit(1);
        }
    };

    if let Err(error) = repository.migrate().await {
        tracing::error!(%error, "Failed to apply migrations");
        std::process::exit(1);
    }
    tracing::info!("Database connected successfully");

    match repository.count().await {
        Ok(count) => tracing::info!(count, "Todos table ready"),
        Err(error) => tracing::warn!(%error, "Could not query todos table"),
    }

    repository
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
