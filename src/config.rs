use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Report failures with 4xx/5xx status codes instead of 200 + `{"error"}`.
    /// Set via TOKENS_STRICT_STATUS. Default: off, matching existing clients.
    pub strict_status: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "sqlite://tokens.db?mode=rwc".into(),
            max_connections: 5,
            strict_status: false,
        }
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

/// Build a config from an arbitrary variable source.
pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let port = match lookup("TOKENS_PORT") {
        Some(v) => v
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("invalid TOKENS_PORT: {}", v))?,
        None => defaults.port,
    };

    let max_connections = lookup("TOKENS_MAX_CONNECTIONS")
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(defaults.max_connections);

    Ok(Config {
        port,
        database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
        max_connections,
        strict_status: lookup("TOKENS_STRICT_STATUS")
            .map(|v| parse_flag(&v))
            .unwrap_or(defaults.strict_status),
    })
}

fn parse_flag(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
