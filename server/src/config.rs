//! Server configuration loaded from the environment at startup.
//!
//! A `.env` file in the working directory is honored for local development.

use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

/// Sessions may last at most ten years.
pub const MAX_SESSION_TTL_HOURS: i64 = 10 * 366 * 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// How close a reminder must be to its threshold before it counts as due.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DueWindow {
    pub distance: f64,
    pub days: i64,
}

impl Default for DueWindow {
    fn default() -> Self {
        Self {
            distance: 500.0,
            days: 7,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_filter: String,
    pub session_ttl: Duration,
    pub due_window: DueWindow,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_filter: "info".to_string(),
            session_ttl: Duration::hours(72),
            due_window: DueWindow::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let host: IpAddr = parse_or(&lookup, "HOST", defaults.bind_address.ip())?;
        let port: u16 = parse_or(&lookup, "PORT", defaults.bind_address.port())?;
        let log_filter = lookup("RUST_LOG").unwrap_or(defaults.log_filter);

        let ttl_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", defaults.session_ttl.num_hours())?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl_hours) {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_HOURS".to_string(),
                format!("{ttl_hours} must be between 1 and {MAX_SESSION_TTL_HOURS}"),
            ));
        }
        let session_ttl = Duration::try_hours(ttl_hours).ok_or_else(|| {
            ConfigError::InvalidValue("SESSION_TTL_HOURS".to_string(), format!("{ttl_hours} is out of range"))
        })?;

        let distance: f64 = parse_or(&lookup, "REMINDER_DUE_DISTANCE", defaults.due_window.distance)?;
        let days: i64 = parse_or(&lookup, "REMINDER_DUE_DAYS", defaults.due_window.days)?;
        if !distance.is_finite() || distance < 0.0 || days < 0 {
            return Err(ConfigError::InvalidValue(
                "REMINDER_DUE_DISTANCE/REMINDER_DUE_DAYS".to_string(),
                "due window must be non-negative".to_string(),
            ));
        }

        Ok(Self {
            bind_address: SocketAddr::new(host, port),
            log_filter,
            session_ttl,
            due_window: DueWindow { distance, days },
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), format!("'{raw}': {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.session_ttl, Duration::hours(72));
        assert_eq!(config.due_window, DueWindow::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("REMINDER_DUE_DISTANCE", "1000"),
            ("REMINDER_DUE_DAYS", "14"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.due_window, DueWindow { distance: 1000.0, days: 14 });
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        assert!(Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", "0")])).is_err());
    }

    #[test]
    fn huge_ttl_is_an_error_not_a_panic() {
        for hours in ["87841", "10000000000", "3000000000000", "9223372036854775807"] {
            let err = Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", hours)])).unwrap_err();
            assert!(err.to_string().contains("SESSION_TTL_HOURS"), "{hours}");
        }
        let longest = Config::from_lookup(lookup(&[("SESSION_TTL_HOURS", "87840")])).unwrap();
        assert_eq!(longest.session_ttl, Duration::hours(MAX_SESSION_TTL_HOURS));
    }
}
