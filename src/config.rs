//! Environment-driven settings for the server and the store.
//!
//! Values are read after `dotenvy` has loaded any `.env` file, so local
//! overrides work without exporting variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub platform_name: String,
    pub default_community_slug: String,
    pub bcrypt_cost: u32,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            platform_name: "WRENCH".to_string(),
            default_community_slug: "automotive".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_username: "wrenchadmin".to_string(),
            admin_email: "owner@wrench-platform.local".to_string(),
            admin_password: "ChangeMeNow!123".to_string(),
            log_json: false,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load `.env` (if present) and overlay `WRENCH_*` variables on the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup("WRENCH_BIND") {
            config.bind_addr = value
                .parse()
                .map_err(|_| ConfigError::Invalid { var: "WRENCH_BIND", value })?;
        }
        if let Some(value) = lookup("WRENCH_PLATFORM_NAME") {
            config.platform_name = value;
        }
        if let Some(value) = lookup("WRENCH_DEFAULT_COMMUNITY") {
            config.default_community_slug = value.trim().to_lowercase();
        }
        if let Some(value) = lookup("WRENCH_BCRYPT_COST") {
            config.bcrypt_cost = match value.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => return Err(ConfigError::Invalid { var: "WRENCH_BCRYPT_COST", value }),
            };
        }
        if let Some(value) = lookup("WRENCH_ADMIN_USERNAME") {
            config.admin_username = value;
        }
        if let Some(value) = lookup("WRENCH_ADMIN_EMAIL") {
            config.admin_email = value;
        }
        if let Some(value) = lookup("WRENCH_ADMIN_PASSWORD") {
            config.admin_password = value;
        }
        if let Some(value) = lookup("WRENCH_LOG_JSON") {
            config.log_json = parse_flag(&value)
                .ok_or(ConfigError::Invalid { var: "WRENCH_LOG_JSON", value })?;
        }
        config.log_dir = lookup("WRENCH_LOG_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.platform_name, "WRENCH");
        assert_eq!(config.default_community_slug, "automotive");
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(!config.log_json);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("WRENCH_BIND", "127.0.0.1:9090"),
            ("WRENCH_DEFAULT_COMMUNITY", " HVAC "),
            ("WRENCH_BCRYPT_COST", "4"),
            ("WRENCH_LOG_JSON", "true"),
            ("WRENCH_LOG_DIR", "/tmp/wrench-logs"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.default_community_slug, "hvac");
        assert_eq!(config.bcrypt_cost, 4);
        assert!(config.log_json);
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/wrench-logs")));
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("WRENCH_BIND", "nowhere")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("WRENCH_BCRYPT_COST", "2")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("WRENCH_LOG_JSON", "maybe")])).is_err());
    }
}
