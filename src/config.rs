//! Server configuration from environment variables
//!
//! Every setting has a development default, so the server starts with no
//! environment at all. Values that fail to parse fall back to the default
//! with a warning.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5500";
pub const DEFAULT_STATIC_DIR: &str = "frontend";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_COUNTRY_CODES: &str = "in";
pub const DEFAULT_USER_AGENT: &str = "KrishiMitra/1.0";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// `PORT`
    pub port: u16,
    /// `FRONTEND_URL` - origin allowed by CORS in addition to localhost
    pub frontend_url: String,
    /// `STATIC_DIR` - frontend files served for non-API paths
    pub static_dir: PathBuf,
    /// `CROP_CATALOG` - JSON catalog path; built-in table when unset
    pub catalog_path: Option<PathBuf>,
    /// `NOMINATIM_URL`
    pub nominatim_url: String,
    /// `GEOCODE_COUNTRY_CODES` - restricts forward geocoding results
    pub country_codes: String,
    /// `GEOCODE_USER_AGENT` - Nominatim requires an identifying agent
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            catalog_path: None,
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            country_codes: DEFAULT_COUNTRY_CODES.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test map, ...)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Invalid PORT '{}', using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        Self {
            port,
            frontend_url: get("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            catalog_path: get("CROP_CATALOG").map(PathBuf::from),
            nominatim_url: get("NOMINATIM_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.nominatim_url),
            country_codes: get("GEOCODE_COUNTRY_CODES").unwrap_or(defaults.country_codes),
            user_agent: get("GEOCODE_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}
