//! API configuration: bind address, store/ERP connection, CORS, and
//! store-backed rate limiting (spec.md §6, §9.1).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_host: String,
    pub bind_port: u16,

    pub store_host: String,
    pub store_port: u16,
    pub store_password: Option<String>,
    pub store_db: u8,

    pub erp_base_url: String,
    pub erp_api_key: String,
    pub erp_api_secret: String,

    pub cors_origins: Vec<String>,

    pub rate_limit_enabled: bool,
    pub rate_limit_per_device_per_minute: u32,
    pub rate_limit_window: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            bind_port: 3000,

            store_host: "127.0.0.1".to_string(),
            store_port: 6379,
            store_password: None,
            store_db: 0,

            erp_base_url: "http://127.0.0.1:8000".to_string(),
            erp_api_key: String::new(),
            erp_api_secret: String::new(),

            cors_origins: Vec::new(),

            rate_limit_enabled: true,
            rate_limit_per_device_per_minute: 120,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl ApiConfig {
    /// Environment variables:
    /// - `PROWHEY_API_BIND`, `PORT`: bind host/port.
    /// - `STORE_HOST`/`STORE_PORT`/`STORE_PASSWORD`/`STORE_DB`.
    /// - `ERP_BASE_URL`, `ERP_API_KEY`, `ERP_API_SECRET`.
    /// - `PROWHEY_CORS_ORIGINS`: comma-separated, empty means allow all.
    /// - `PROWHEY_RATE_LIMIT_ENABLED`, `PROWHEY_RATE_LIMIT_PER_DEVICE_PER_MINUTE`.
    pub fn from_env() -> Self {
        let default = Self::default();

        let bind_host = std::env::var("PROWHEY_API_BIND").unwrap_or(default.bind_host);
        let bind_port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.bind_port);

        let store_host = std::env::var("STORE_HOST").unwrap_or(default.store_host);
        let store_port = std::env::var("STORE_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.store_port);
        let store_password = std::env::var("STORE_PASSWORD").ok().filter(|s| !s.is_empty());
        let store_db = std::env::var("STORE_DB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.store_db);

        let erp_base_url = std::env::var("ERP_BASE_URL").unwrap_or(default.erp_base_url);
        let erp_api_key = std::env::var("ERP_API_KEY").unwrap_or(default.erp_api_key);
        let erp_api_secret = std::env::var("ERP_API_SECRET").unwrap_or(default.erp_api_secret);

        let cors_origins = std::env::var("PROWHEY_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let rate_limit_enabled = std::env::var("PROWHEY_RATE_LIMIT_ENABLED")
            .ok()
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(default.rate_limit_enabled);
        let rate_limit_per_device_per_minute = std::env::var("PROWHEY_RATE_LIMIT_PER_DEVICE_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default.rate_limit_per_device_per_minute);

        Self {
            bind_host,
            bind_port,
            store_host,
            store_port,
            store_password,
            store_db,
            erp_base_url,
            erp_api_key,
            erp_api_secret,
            cors_origins,
            rate_limit_enabled,
            rate_limit_per_device_per_minute,
            rate_limit_window: default.rate_limit_window,
        }
    }

    /// `redis://[:password@]host:port/db`, consumed by [`prowhey_store::RedisStore::connect`].
    pub fn store_url(&self) -> String {
        match &self.store_password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.store_host, self.store_port, self.store_db
            ),
            None => format!("redis://{}:{}/{}", self.store_host, self.store_port, self.store_db),
        }
    }
}
