use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub controller: ControllerConfig,
    pub records: RecordsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ControllerConfig {
    /// Seconds between calculation cycles
    #[validate(range(min = 1, max = 3600))]
    pub tick_seconds: u64,
    /// Maximum age of a reused sensor snapshot, at most 30 s
    #[validate(range(min = 0, max = 30))]
    pub snapshot_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// YAML file with global, group and window records
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_secs: 30,
                enable_cors: false,
            },
            controller: ControllerConfig {
                tick_seconds: 60,
                snapshot_ttl_seconds: 30,
            },
            records: RecordsConfig {
                path: PathBuf::from("config/windows.yaml"),
            },
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `SWS__*` environment variables.
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("SWS__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("invalid service configuration")?;
        cfg.validate().context("service configuration out of range")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg =
            Config::from_figment(Figment::from(Serialized::defaults(Config::default()))).unwrap();
        assert_eq!(cfg.controller.snapshot_ttl_seconds, 30);
        assert_eq!(cfg.server.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_toml_overrides_and_validation() {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string("[controller]\ntick_seconds = 15\n"));
        assert_eq!(Config::from_figment(figment).unwrap().controller.tick_seconds, 15);

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::string("[controller]\ntick_seconds = 0\n"));
        assert!(Config::from_figment(figment).is_err());
    }

    #[test]
    fn test_snapshot_ttl_capped_at_30_seconds() {
        let ttl = |secs: u64| {
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::string(&format!("[controller]\nsnapshot_ttl_seconds = {secs}\n")))
        };
        assert_eq!(Config::from_figment(ttl(30)).unwrap().controller.snapshot_ttl_seconds, 30);
        assert!(Config::from_figment(ttl(31)).is_err());
        assert!(Config::from_figment(ttl(300)).is_err());
    }
}
