use clap::Parser;
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:money_manager.db")]
    pub database_url: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Upper bound for a single store call, in milliseconds. Unbounded when unset.
    #[arg(long, env = "STORE_TIMEOUT_MS")]
    pub store_timeout_ms: Option<u64>,
}

impl Config {
    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override() {
        let config =
            Config::try_parse_from(["app", "--database-url", "sqlite::memory:", "--port", "8081"])
                .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.port, 8081);
    }

    #[test]
    fn test_store_timeout_from_args() {
        let config = Config::try_parse_from(["app", "--store-timeout-ms", "250"]).unwrap();
        assert_eq!(config.store_timeout(), Some(Duration::from_millis(250)));
    }
}
