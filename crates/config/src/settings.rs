use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub feed: FeedSettings,
    pub mail: MailSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

/// Limits for feed publications and the live change channel.
#[derive(Debug, Deserialize, Clone)]
pub struct FeedSettings {
    pub default_limit: u32,
    pub max_limit: u32,
    /// Capacity of the broadcast channel carrying feed changes to live subscriptions.
    pub event_buffer: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailSettings {
    pub enabled: bool,
    pub digest_interval_secs: u64,
    pub from: String,
    /// Digests are only logged when no SMTP host is set.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("SOCIUM"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "socium")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "socium")?
            .set_default("feed.default_limit", 20)?
            .set_default("feed.max_limit", 100)?
            .set_default("feed.event_buffer", 1024)?
            .set_default("mail.enabled", false)?
            .set_default("mail.digest_interval_secs", 3600)?
            .set_default("mail.from", "noreply@socium.local")?
            .set_default("mail.smtp_port", 587)?
            .set_default("mail.smtp_tls", true)?
            .build()?;

        config.try_deserialize()
    }
}
