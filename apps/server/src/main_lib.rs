use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use allocation_core::allocations::{AllocationService, AllocationServiceTrait};
use allocation_core::batches::{SendService, SendServiceTrait};
use allocation_core::export::{CliInvoker, FileGenerator};
use allocation_core::health::StoreStatusTrait;
use allocation_core::trade_lookup::{TradeLookupClient, TradeLookupConfig};
use allocation_storage_postgres::allocations::AllocationRepository;
use allocation_storage_postgres::batches::BatchHistoryRepository;
use allocation_storage_postgres::{create_pool, run_migrations, StoreStatus};

use crate::config::Config;

pub struct AppState {
    pub allocation_service: Arc<dyn AllocationServiceTrait>,
    pub send_service: Arc<dyn SendServiceTrait>,
    pub store_status: Arc<dyn StoreStatusTrait>,
}

pub fn init_tracing(config: &Config) {
    let fmt_layer = fmt::layer().json().with_current_span(false);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    // Bridge `log` records from the core crates into tracing.
    tracing_log::LogTracer::init().ok();
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let pool = create_pool(&config.database.url())?;
    run_migrations(&pool)?;

    let allocation_repository = Arc::new(AllocationRepository::new(pool.clone()));
    let batch_history_repository = Arc::new(BatchHistoryRepository::new(pool.clone()));

    let mut lookup_config = TradeLookupConfig::new(config.trade_service_base_url.clone());
    lookup_config.max_retries = config.retry_max_attempts;
    lookup_config.base_delay = config.retry_base_delay();
    let trade_lookup = Arc::new(TradeLookupClient::new(lookup_config));

    let file_generator = Arc::new(FileGenerator::new(&config.output_dir));
    let cli_invoker = Arc::new(CliInvoker::new(
        &config.cli_command_template,
        &config.output_dir,
    ));
    if let Err(err) = cli_invoker.validate_command() {
        tracing::warn!("CLI handoff not ready: {}", err);
    }

    let allocation_service: Arc<dyn AllocationServiceTrait> = Arc::new(AllocationService::new(
        allocation_repository.clone(),
        trade_lookup,
    ));
    let send_service: Arc<dyn SendServiceTrait> = Arc::new(SendService::new(
        batch_history_repository,
        allocation_repository,
        file_generator,
        cli_invoker,
        config.file_cleanup_enabled,
    ));
    let store_status: Arc<dyn StoreStatusTrait> = Arc::new(StoreStatus::new(pool));

    tracing::info!(
        metrics_enabled = config.metrics_enabled,
        tracing_enabled = config.tracing_enabled,
        "observability toggles loaded"
    );

    Ok(Arc::new(AppState {
        allocation_service,
        send_service,
        store_status,
    }))
}
