use crate::geocode::{provider_chain, Provider, ProviderKind};
use std::{env, path::PathBuf, time::Duration};

pub const USER_AGENT: &str = "Cisco-Spaces-WiFi7-Dashboard/1.0 (contact: dashboard@cisco.com)";
pub const DEFAULT_SITES_PATH: &str = "data/sites.json";
pub const DEFAULT_OUTPUT_PATH: &str = "data/geocoded_sites.json";

// Nominatim and Photon both ask for at most ~1 request per second.
pub const REQUEST_DELAY: Duration = Duration::from_millis(1100);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

const ENV_MAPBOX_TOKEN: &str = "MAPBOX_TOKEN";
const ENV_GEOCODER_PROVIDER: &str = "GEOCODER_PROVIDER";

/// Run configuration, captured once at startup.
#[derive(Debug, Clone)]
pub struct Cfg {
    pub sites_path: PathBuf,
    pub output_path: PathBuf,
    pub preferred_provider: ProviderKind,
    pub mapbox_token: Option<String>,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub offline: bool,
}

impl Cfg {
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(token) = lookup(ENV_MAPBOX_TOKEN) {
            cfg.set_mapbox_token(&token);
        }
        if let Some(value) = lookup(ENV_GEOCODER_PROVIDER) {
            cfg.set_provider(&value);
        }
        cfg
    }

    /// Apply a provider preference. Unknown values fall back to Photon.
    pub fn set_provider(&mut self, value: &str) {
        self.preferred_provider = ProviderKind::from_setting(value).unwrap_or_else(|| {
            log::warn!(
                "Unknown geocoder provider '{}', using {}",
                value,
                ProviderKind::Photon
            );
            ProviderKind::Photon
        });
    }

    pub fn set_mapbox_token(&mut self, token: &str) {
        let token = token.trim();
        self.mapbox_token = if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        };
    }

    /// The effective provider fallback chain.
    pub fn provider_chain(&self) -> Vec<Provider> {
        if self.preferred_provider == ProviderKind::Mapbox && self.mapbox_token.is_none() {
            log::warn!("Mapbox preferred but {} is not set: skipping it", ENV_MAPBOX_TOKEN);
        }
        provider_chain(self.preferred_provider, self.mapbox_token.as_deref())
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self {
            sites_path: PathBuf::from(DEFAULT_SITES_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            preferred_provider: ProviderKind::Photon,
            mapbox_token: None,
            request_delay: REQUEST_DELAY,
            request_timeout: REQUEST_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            offline: false,
        }
    }
}
