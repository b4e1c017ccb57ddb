//! API server configuration.

/// Wiring for the HTTP listener and its backing stores.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Session store (Redis) connection URL.
    pub redis_url: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable       | Default                            |
    /// |----------------|------------------------------------|
    /// | `BIND_ADDR`    | `127.0.0.1:3100`                   |
    /// | `DATABASE_URL` | `postgres://localhost:5432/warden` |
    /// | `REDIS_URL`    | `redis://127.0.0.1:6379`           |
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("BIND_ADDR") {
            config.bind_addr = v;
        }
        if let Ok(v) = std::env::var("DATABASE_URL") {
            config.database_url = v;
        }
        if let Ok(v) = std::env::var("REDIS_URL") {
            config.redis_url = v;
        }
        config
    }

    /// Apply explicit overrides (e.g. command-line flags) on top.
    pub fn with_overrides(
        mut self,
        bind_addr: Option<String>,
        database_url: Option<String>,
        redis_url: Option<String>,
    ) -> Self {
        if let Some(v) = bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = database_url {
            self.database_url = v;
        }
        if let Some(v) = redis_url {
            self.redis_url = v;
        }
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3100".into(),
            database_url: "postgres://localhost:5432/warden".into(),
            redis_url: "redis://127.0.0.1:6379".into(),
        }
    }
}
