use secrecy::Secret;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string; the in-memory store is used when unset.
    pub database_url: Option<Secret<String>>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,

    // Serve the OpenAPI document and Swagger UI
    pub enable_swagger: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        Self::from_source(config::Environment::default().separator("__"))
    }

    fn from_source(
        source: impl config::Source + Send + Sync + 'static,
    ) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .set_default("database_max_connections", 20)?
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("enable_swagger", false)?
            .add_source(source)
            .build()?;

        Ok(Self {
            database_url: config
                .get::<String>("database_url")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .map(Secret::new),
            database_max_connections: config.get("database_max_connections")?,
            host: config.get("host")?,
            port: config.get("port")?,
            enable_swagger: config.get("enable_swagger")?,
        })
    }
}
