use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::RunQueryDsl;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use allocation_core::errors::DatabaseError;
use allocation_core::health::StoreStatusTrait;
use allocation_core::Result;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Pool sizing matches the service's shared-resource policy: ~25 active
/// connections, 5 idle, recycled after five minutes.
const POOL_MAX_SIZE: u32 = 25;
const POOL_MIN_IDLE: u32 = 5;
const POOL_MAX_LIFETIME: Duration = Duration::from_secs(5 * 60);
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn create_pool(database_url: &str) -> Result<Arc<DbPool>> {
    info!("creating database connection pool");
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(POOL_MAX_SIZE)
        .min_idle(Some(POOL_MIN_IDLE))
        .max_lifetime(Some(POOL_MAX_LIFETIME))
        .connection_timeout(POOL_CONNECTION_TIMEOUT)
        .build(manager)
        .map_err(|err| DatabaseError::PoolCreationFailed(err.to_string()))?;
    Ok(Arc::new(pool))
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("running database migrations");
    let mut connection = pool.get().map_err(|err| {
        error!("failed to get connection for migrations: {}", err);
        DatabaseError::ConnectionFailed(err.to_string())
    })?;

    connection.run_pending_migrations(MIGRATIONS).map_err(|err| {
        error!("database migration failed: {}", err);
        DatabaseError::MigrationFailed(err.to_string())
    })?;
    info!("database migrations completed");
    Ok(())
}

/// Gets a connection from the pool.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().map_err(|err| {
        error!("failed to get database connection from pool: {}", err);
        DatabaseError::ConnectionFailed(err.to_string()).into()
    })
}

/// Readiness check backed by a trivial round-trip query.
pub struct StoreStatus {
    pool: Arc<DbPool>,
}

impl StoreStatus {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl StoreStatusTrait for StoreStatus {
    fn check_store(&self) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .map_err(|err| DatabaseError::QueryFailed(err.to_string()))?;
        Ok(())
    }
}
