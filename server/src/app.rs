//! Core application

use std::sync::Arc;

use anyhow::Result;

use crate::api::{ApiServer, AppState};
use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::SqliteService;

pub struct CoreApp {
    pub config: AppConfig,
    pub database: Arc<SqliteService>,
    pub shutdown: ShutdownService,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        match command {
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        app.start_server().await
    }

    async fn init(cli: &cli::CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let database = Arc::new(SqliteService::init(&config.database.path).await?);
        let shutdown = ShutdownService::new();

        Ok(Self {
            config,
            database,
            shutdown,
        })
    }

    async fn start_server(self) -> Result<()> {
        self.shutdown.install_signal_handlers();

        let state = AppState::new(
            self.database.pool().clone(),
            self.config.auth.api_key.clone(),
        );
        let server = ApiServer::new(
            state,
            self.config.server.host.clone(),
            self.config.server.port,
        );

        let result = server.serve(self.shutdown.clone()).await;

        self.shutdown.drain_tasks().await;
        self.database.close().await;
        tracing::info!("Shutdown complete");
        result
    }

    fn init_logging() {
        use tracing_subscriber::EnvFilter;

        let filter = EnvFilter::try_from_env(ENV_LOG)
            .unwrap_or_else(|_| EnvFilter::new(format!("info,{APP_NAME_LOWER}=debug")));

        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
