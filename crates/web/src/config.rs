use std::{env, error, fmt, net::SocketAddr, str::FromStr, time::Duration};

use log::warn;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_TOKEN_VALIDITY_HOURS: i64 = 24;

/// Only meant for local development, a warning is logged when it is used.
const DEVELOPMENT_SECRET: &str = "parking-development-secret-change-me";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub token_validity: chrono::Duration,
    pub admin_username: String,
    pub admin_password: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: DEVELOPMENT_SECRET.to_owned(),
            token_validity: chrono::Duration::hours(DEFAULT_TOKEN_VALIDITY_HOURS),
            admin_username: "admin".to_owned(),
            admin_password: "admin123".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_address: SocketAddr,
    pub refresh_interval: Duration,
    pub auth: AuthConfig,
}

#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: `{}`", self.variable, self.value)
    }
}

impl error::Error for ConfigError {}

fn parse_var<T: FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError { variable, value }),
        Err(_) => Ok(default),
    }
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_address = parse_var(
            "BIND_ADDRESS",
            SocketAddr::from(([0, 0, 0, 0], 3000)),
        )?;
        let refresh_secs = parse_var("REFRESH_INTERVAL_SECS", DEFAULT_REFRESH_INTERVAL_SECS)?;
        if refresh_secs == 0 {
            return Err(ConfigError {
                variable: "REFRESH_INTERVAL_SECS",
                value: "0".to_owned(),
            });
        }
        let validity_hours = parse_var("TOKEN_VALIDITY_HOURS", DEFAULT_TOKEN_VALIDITY_HOURS)?;

        let defaults = AuthConfig::default();
        let secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET is not set, using the development secret");
            defaults.secret.clone()
        });

        Ok(Self {
            bind_address,
            refresh_interval: Duration::from_secs(refresh_secs),
            auth: AuthConfig {
                secret,
                token_validity: chrono::Duration::hours(validity_hours),
                admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
                admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            },
        })
    }
}
