use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::types::Vec3;

/// Complete application configuration, loaded from environment variables or
/// default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub shipment: ShipmentDefaults,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment
    /// variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            shipment: ShipmentDefaults::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value =
            env_string("STACK_IT_UP_API_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, effective_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse STACK_IT_UP_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    Self::DEFAULT_HOST
                        .parse::<IpAddr>()
                        .expect("Default host must be valid"),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("STACK_IT_UP_API_PORT") {
            Some(raw) => match raw.parse::<u16>() {
                Ok(value) if value != 0 => value,
                Ok(_) => {
                    eprintln!(
                        "⚠️ STACK_IT_UP_API_PORT must not be 0. Using {}.",
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
                Err(err) => {
                    eprintln!(
                        "⚠️ Could not parse STACK_IT_UP_API_PORT ('{}'): {}. Using {}.",
                        raw,
                        err,
                        Self::DEFAULT_PORT
                    );
                    Self::DEFAULT_PORT
                }
            },
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host: effective_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Deployment defaults for packing requests.
///
/// Requests may override any extent; counts are always request-supplied.
/// The known deployment ships a standard container with one large and one
/// small transport case type.
#[derive(Clone, Debug)]
pub struct ShipmentDefaults {
    container: (f64, f64, f64),
    large_case: (f64, f64, f64),
    small_case: (f64, f64, f64),
    max_requested: u32,
}

impl ShipmentDefaults {
    const CONTAINER_VAR: &'static str = "STACK_IT_UP_CONTAINER_DIMS";
    const LARGE_CASE_VAR: &'static str = "STACK_IT_UP_LARGE_CASE_DIMS";
    const SMALL_CASE_VAR: &'static str = "STACK_IT_UP_SMALL_CASE_DIMS";
    const MAX_REQUESTED_VAR: &'static str = "STACK_IT_UP_MAX_REQUESTED";

    pub const DEFAULT_CONTAINER: (f64, f64, f64) = (6058.0, 2591.0, 2438.0);
    pub const DEFAULT_LARGE_CASE: (f64, f64, f64) = (1105.0, 1265.0, 975.0);
    pub const DEFAULT_SMALL_CASE: (f64, f64, f64) = (221.0, 96.3, 90.3);
    pub const DEFAULT_MAX_REQUESTED: u32 = 100_000;

    fn from_env() -> Self {
        Self {
            container: load_dims_with_warning(Self::CONTAINER_VAR, Self::DEFAULT_CONTAINER),
            large_case: load_dims_with_warning(Self::LARGE_CASE_VAR, Self::DEFAULT_LARGE_CASE),
            small_case: load_dims_with_warning(Self::SMALL_CASE_VAR, Self::DEFAULT_SMALL_CASE),
            max_requested: load_max_requested(Self::MAX_REQUESTED_VAR, Self::DEFAULT_MAX_REQUESTED),
        }
    }

    /// Default container extent.
    pub fn container(&self) -> (f64, f64, f64) {
        self.container
    }

    /// Default extent of the large case type.
    pub fn large_case(&self) -> (f64, f64, f64) {
        self.large_case
    }

    /// Default extent of the small case type.
    pub fn small_case(&self) -> (f64, f64, f64) {
        self.small_case
    }

    /// Ceiling for requested counts per case type.
    pub fn max_requested(&self) -> u32 {
        self.max_requested
    }
}

impl Default for ShipmentDefaults {
    fn default() -> Self {
        Self {
            container: Self::DEFAULT_CONTAINER,
            large_case: Self::DEFAULT_LARGE_CASE,
            small_case: Self::DEFAULT_SMALL_CASE,
            max_requested: Self::DEFAULT_MAX_REQUESTED,
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

/// Parses an extent from `LxWxH` notation (e.g. `6058x2591x2438`).
///
/// All three components must be positive and finite.
fn parse_dims(raw: &str) -> Option<(f64, f64, f64)> {
    let parts: Vec<&str> = raw
        .split(['x', 'X'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 {
        return None;
    }

    let length: f64 = parts[0].parse().ok()?;
    let width: f64 = parts[1].parse().ok()?;
    let height: f64 = parts[2].parse().ok()?;

    let dims = Vec3::new(length, width, height);
    if !dims.is_valid_dimension() {
        return None;
    }
    Some(dims.as_tuple())
}

fn load_dims_with_warning(var_name: &str, default: (f64, f64, f64)) -> (f64, f64, f64) {
    match env_string(var_name) {
        Some(raw) => match parse_dims(&raw) {
            Some(dims) => dims,
            None => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as LxWxH extent with positive components. Using {}x{}x{}.",
                    var_name, raw, default.0, default.1, default.2
                );
                default
            }
        },
        None => default,
    }
}

fn load_max_requested(var_name: &str, default: u32) -> u32 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<u32>() {
            Ok(value) if value != 0 => value,
            Ok(_) => {
                eprintln!("⚠️ {} must not be 0. Using {}.", var_name, default);
                default
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dims_valid_values() {
        assert_eq!(parse_dims("6058x2591x2438"), Some((6058.0, 2591.0, 2438.0)));
        assert_eq!(parse_dims("221x96.3x90.3"), Some((221.0, 96.3, 90.3)));
        assert_eq!(parse_dims(" 10 x 20 x 30 "), Some((10.0, 20.0, 30.0)));
        assert_eq!(parse_dims("1X2X3"), Some((1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_parse_dims_invalid_values() {
        assert_eq!(parse_dims(""), None);
        assert_eq!(parse_dims("10x20"), None);
        assert_eq!(parse_dims("10x20x30x40"), None);
        assert_eq!(parse_dims("10x-20x30"), None);
        assert_eq!(parse_dims("10x0x30"), None);
        assert_eq!(parse_dims("10xabcx30"), None);
        assert_eq!(parse_dims("10x20xinf"), None);
    }

    #[test]
    fn test_shipment_defaults() {
        let defaults = ShipmentDefaults::default();
        assert_eq!(defaults.container(), (6058.0, 2591.0, 2438.0));
        assert_eq!(defaults.large_case(), (1105.0, 1265.0, 975.0));
        assert_eq!(defaults.small_case(), (221.0, 96.3, 90.3));
        assert_eq!(defaults.max_requested(), 100_000);
    }
}
