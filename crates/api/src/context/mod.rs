//! Application context - dependency injection container

use std::sync::Arc;

use bergerie_common::{Clock, FixedDelay, Pacer, SystemClock};
use bergerie_core::{
    CallProvider, CallRecordRepository, CallSyncService, CallSyncSettings, CallbackService,
    ConnectionRepository, ConnectionService, DonationImportService, DonationImportSettings,
    DonationProvider, DonationRepository, OAuthTokenClient, ReceiptNumberSequence, TokenManager,
};
use bergerie_domain::{Config, Result};
use bergerie_infra::{
    config, DbManager, HelloAssoClient, HelloAssoOAuthClient, HttpClient, RingoverClient,
    SqliteCallRecordRepository, SqliteConnectionRepository, SqliteDonationRepository,
    SqliteReceiptSequence,
};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub connection_repository: Arc<dyn ConnectionRepository>,

    pub connections: Arc<ConnectionService>,
    pub call_sync: Arc<CallSyncService>,
    pub callbacks: Arc<CallbackService>,
    pub donation_import: Arc<DonationImportService>,
}

impl AppContext {
    /// Create the context from the loaded configuration
    /// (see [`bergerie_infra::config::load`]).
    pub async fn new() -> Result<Self> {
        Self::new_with_config(config::load()?).await
    }

    /// Create the context from an explicit configuration.
    ///
    /// Tests use this to point the database at a temporary file and the
    /// provider base URLs at mock servers.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;
        let pool = db.pool();

        let connection_repository: Arc<dyn ConnectionRepository> =
            Arc::new(SqliteConnectionRepository::new(pool.clone()));
        let call_records: Arc<dyn CallRecordRepository> =
            Arc::new(SqliteCallRecordRepository::new(pool.clone()));
        let donations: Arc<dyn DonationRepository> =
            Arc::new(SqliteDonationRepository::new(pool.clone()));
        let receipts: Arc<dyn ReceiptNumberSequence> = Arc::new(SqliteReceiptSequence::new(pool));

        let http = HttpClient::from_config(&config.http)?;
        let call_provider: Arc<dyn CallProvider> =
            Arc::new(RingoverClient::new(http.clone(), &config.ringover.base_url)?);
        let oauth_client: Arc<dyn OAuthTokenClient> =
            Arc::new(HelloAssoOAuthClient::new(http.clone(), &config.helloasso.base_url));
        let donation_provider: Arc<dyn DonationProvider> =
            Arc::new(HelloAssoClient::new(http, &config.helloasso.base_url)?);

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let page_pacer: Arc<dyn Pacer> =
            Arc::new(FixedDelay::from_millis(config.sync.page_delay_ms));
        let probe_pacer: Arc<dyn Pacer> =
            Arc::new(FixedDelay::from_millis(config.sync.probe_delay_ms));

        let token_manager = Arc::new(TokenManager::new(
            Arc::clone(&oauth_client),
            Arc::clone(&connection_repository),
            Arc::clone(&clock),
            config.helloasso.token_refresh_margin_secs,
        ));

        let connections = Arc::new(ConnectionService::new(
            Arc::clone(&connection_repository),
            oauth_client,
            Arc::clone(&donation_provider),
            Arc::clone(&call_provider),
            Arc::clone(&clock),
            Arc::clone(&probe_pacer),
        ));

        let call_sync = Arc::new(
            CallSyncService::new(
                call_provider,
                Arc::clone(&connection_repository),
                Arc::clone(&call_records),
                Arc::clone(&clock),
                Arc::clone(&page_pacer),
                probe_pacer,
            )
            .with_settings(CallSyncSettings::from(&config.ringover)),
        );

        let callbacks = Arc::new(CallbackService::new(call_records, Arc::clone(&clock)));

        let donation_import = Arc::new(
            DonationImportService::new(
                donation_provider,
                donations,
                receipts,
                token_manager,
                Arc::clone(&connection_repository),
                clock,
                page_pacer,
            )
            .with_settings(DonationImportSettings::from(&config.helloasso)),
        );

        info!(db_path = %db.path().display(), "application context initialised");

        Ok(Self {
            config,
            db,
            connection_repository,
            connections,
            call_sync,
            callbacks,
            donation_import,
        })
    }

    /// Verify the database answers.
    pub fn health_check(&self) -> Result<()> {
        self.db.health_check()
    }
}
