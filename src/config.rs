use serde::Deserialize;
use std::env;

pub const DEFAULT_PORT: u16 = 30000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let port = settings
            .get_int("server.port")
            .ok()
            .and_then(|value| u16::try_from(value).ok())
            .or_else(|| {
                env::var("PORT")
                    .ok()
                    .and_then(|value| value.parse::<u16>().ok())
            })
            .unwrap_or(DEFAULT_PORT);

        Ok(Config { port })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { port: DEFAULT_PORT }
    }
}
