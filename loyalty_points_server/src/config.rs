use std::env;

use log::*;
use loyalty_points_engine::accrual::{
    normalize_base_url,
    AccrualConfig,
    DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WORKERS,
};
use lpg_common::helpers::{parse_positive, parse_seconds};

use crate::cli::Arguments;

const DEFAULT_LPG_HOST: &str = "localhost";
const DEFAULT_LPG_PORT: u16 = 8081;
const DEFAULT_DATABASE_URI: &str = "sqlite://data/loyalty_points.db";
const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8080";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub accrual: AccrualConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPG_HOST.to_string(),
            port: DEFAULT_LPG_PORT,
            database_url: DEFAULT_DATABASE_URI.to_string(),
            accrual: AccrualConfig::new(DEFAULT_ACCRUAL_ADDRESS),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let (host, port) = match env::var("RUN_ADDRESS") {
            Ok(address) => parse_run_address(&address),
            Err(_) => (DEFAULT_LPG_HOST.to_string(), DEFAULT_LPG_PORT),
        };
        let database_url = env::var("DATABASE_URI").ok().unwrap_or_else(|| {
            info!("🪛️ DATABASE_URI is not set. Using the default, {DEFAULT_DATABASE_URI}.");
            DEFAULT_DATABASE_URI.to_string()
        });
        let accrual_address = env::var("ACCRUAL_SYSTEM_ADDRESS").ok().unwrap_or_else(|| {
            warn!("🪛️ ACCRUAL_SYSTEM_ADDRESS is not set. Using the default, {DEFAULT_ACCRUAL_ADDRESS}.");
            DEFAULT_ACCRUAL_ADDRESS.to_string()
        });
        let workers = env_or_default("ACCRUAL_WORKERS", DEFAULT_WORKERS, parse_positive::<usize>);
        let poll_interval = env_or_default("ACCRUAL_POLL_INTERVAL", DEFAULT_POLL_INTERVAL, parse_seconds);
        let request_timeout = env_or_default("ACCRUAL_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT, parse_seconds);
        let accrual =
            AccrualConfig { base_url: normalize_base_url(&accrual_address), workers, poll_interval, request_timeout };
        Self { host, port, database_url, accrual }
    }

    /// Command-line flags take precedence over the environment.
    pub fn apply_arguments(&mut self, args: &Arguments) {
        if let Some(address) = &args.run_address {
            let (host, port) = parse_run_address(address);
            self.host = host;
            self.port = port;
        }
        if let Some(url) = &args.database_uri {
            self.database_url = url.clone();
        }
        if let Some(address) = &args.accrual_address {
            self.accrual.base_url = normalize_base_url(address);
        }
    }
}

/// Splits `host:port` into its parts. Either part may be left out (`:8081`, `localhost`), in which case the default
/// is used.
pub fn parse_run_address(address: &str) -> (String, u16) {
    let address = address.trim();
    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (address, None),
    };
    let host = if host.is_empty() { DEFAULT_LPG_HOST.to_string() } else { host.to_string() };
    let port = match port {
        None | Some("") => DEFAULT_LPG_PORT,
        Some(p) => p.parse::<u16>().unwrap_or_else(|e| {
            error!("🪛️ {p} is not a valid port for RUN_ADDRESS. {e} Using {DEFAULT_LPG_PORT} instead.");
            DEFAULT_LPG_PORT
        }),
    };
    (host, port)
}

fn env_or_default<T, F>(name: &str, default: T, parse: F) -> T
where
    T: std::fmt::Debug,
    F: Fn(Option<&str>) -> Option<T>,
{
    match env::var(name) {
        Ok(s) => parse(Some(&s)).unwrap_or_else(|| {
            error!("🪛️ {s} is not a valid value for {name}. Using the default, {default:?}, instead.");
            default
        }),
        Err(_) => default,
    }
}
