use std::time::Duration;

/// Runtime configuration, loaded from `ALLOC_`-prefixed environment
/// variables (with `.env` support).
pub struct Config {
    pub server_port: u16,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub trade_service_base_url: String,
    pub output_dir: String,
    pub cli_command_template: String,
    /// Additional lookup attempts after the first.
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub file_cleanup_enabled: bool,
    pub metrics_enabled: bool,
    pub tracing_enabled: bool,
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub ssl_mode: String,
}

impl DatabaseConfig {
    /// Renders the PostgreSQL connection URL.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.ssl_mode
        )
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            server_port: env_parsed("ALLOC_SERVER_PORT", 8089),
            log_level: env_or("ALLOC_LOG_LEVEL", "info"),
            database: DatabaseConfig {
                host: env_or("ALLOC_DB_HOST", "localhost"),
                port: env_parsed("ALLOC_DB_PORT", 5432),
                name: env_or("ALLOC_DB_NAME", "postgres"),
                user: env_or("ALLOC_DB_USER", "postgres"),
                password: env_or("ALLOC_DB_PASSWORD", ""),
                ssl_mode: env_or("ALLOC_DB_SSL_MODE", "disable"),
            },
            trade_service_base_url: env_or("ALLOC_TRADE_SERVICE_URL", "http://localhost:8082"),
            output_dir: env_or("ALLOC_OUTPUT_DIR", "/usr/local/share/files"),
            cli_command_template: env_or("ALLOC_CLI_COMMAND", ""),
            retry_max_attempts: env_parsed("ALLOC_RETRY_MAX_ATTEMPTS", 3),
            retry_base_delay_ms: env_parsed("ALLOC_RETRY_BASE_DELAY_MS", 1000),
            file_cleanup_enabled: env_parsed("ALLOC_FILE_CLEANUP_ENABLED", false),
            metrics_enabled: env_parsed("ALLOC_METRICS_ENABLED", true),
            tracing_enabled: env_parsed("ALLOC_TRACING_ENABLED", true),
        }
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
