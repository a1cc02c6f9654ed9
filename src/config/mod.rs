use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub qr: QrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Default per-request timeout; slow providers carry their own.
    pub timeout_secs: u64,
    /// Entries kept by the click-count response cache.
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// host:port dialed to decide whether the network is usable
    pub probe_addr: String,
    pub probe_timeout_ms: u64,
    /// Skip the probe entirely.
    pub assume_online: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QrConfig {
    /// Image placed in the middle of rendered QR codes.
    pub icon_path: Option<String>,
}

impl Config {
    /// Loads `.env`, then layers built-in defaults, the optional config file
    /// `path` (any format the `config` crate understands, extension optional)
    /// and `MAGPIE_*` environment variables, e.g. `MAGPIE_HTTP__TIMEOUT_SECS`.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(::config::File::with_name(path.unwrap_or("magpie")).required(false))
            .add_source(
                ::config::Environment::with_prefix("MAGPIE")
                    .prefix_separator("_")
                    .separator("__"),
            );

        builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Parses a TOML document on top of the defaults, ignoring the environment.
    pub fn from_toml(document: &str) -> anyhow::Result<Self> {
        Self::defaults()?
            .add_source(::config::File::from_str(document, ::config::FileFormat::Toml))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    fn defaults() -> anyhow::Result<::config::ConfigBuilder<::config::builder::DefaultState>> {
        let builder = ::config::Config::builder()
            .set_default("database.url", "sqlite://./magpie.db?mode=rwc")?
            .set_default("database.max_connections", 4)?
            .set_default(
                "http.user_agent",
                concat!("magpie/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("http.timeout_secs", 15)?
            .set_default("http.cache_capacity", 1_000)?
            .set_default("http.cache_ttl_secs", 60)?
            .set_default("connectivity.probe_addr", "1.1.1.1:443")?
            .set_default("connectivity.probe_timeout_ms", 1_500)?
            .set_default("connectivity.assume_online", false)?;
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_every_section() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.database.url, "sqlite://./magpie.db?mode=rwc");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.http.timeout_secs, 15);
        assert!(config.http.user_agent.starts_with("magpie/"));
        assert!(!config.connectivity.assume_online);
        assert!(config.qr.icon_path.is_none());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let config = Config::from_toml(
            r#"
            [http]
            timeout_secs = 30

            [connectivity]
            assume_online = true
            "#,
        )
        .unwrap();
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.cache_ttl_secs, 60);
        assert!(config.connectivity.assume_online);
    }

    #[test]
    fn test_qr_icon_path_is_read() {
        let config = Config::from_toml(
            r#"
            [qr]
            icon_path = "assets/icon.png"
            "#,
        )
        .unwrap();
        assert_eq!(config.qr.icon_path.as_deref(), Some("assets/icon.png"));
    }
}
