//! Address resolver: walks the provider fallback chain.
//!
//! Flow per address: provider_1 → provider_2 → … → unresolved.
//! Transport failures and empty results both fall through to the next
//! provider. The first coordinate wins.

use super::http::HttpClient;
use super::providers::{AttemptOutcome, Provider};
use super::types::{Coordinate, GeocodeError, ProviderAttempt, ProviderKind};

/// Outcome of resolving one address.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The winning provider and its coordinate, if any.
    pub resolved: Option<(ProviderKind, Coordinate)>,
    /// Every provider tried before the winner (or all of them).
    pub attempts: Vec<ProviderAttempt>,
}

impl Resolution {
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.resolved.map(|(_, c)| c)
    }
}

/// Resolves addresses with an immutable provider chain.
pub struct AddressResolver<C> {
    client: C,
    chain: Vec<Provider>,
    user_agent: String,
}

impl<C: HttpClient> AddressResolver<C> {
    pub fn new(client: C, chain: Vec<Provider>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            chain,
            user_agent: user_agent.into(),
        }
    }

    pub fn chain(&self) -> &[Provider] {
        &self.chain
    }

    /// Resolve one address. Never fails: exhaustion yields `resolved: None`.
    pub fn resolve(&self, address: &str) -> Resolution {
        let mut attempts = Vec::new();

        for provider in &self.chain {
            let kind = provider.kind();
            match provider.attempt(&self.client, address, &self.user_agent) {
                AttemptOutcome::Found(coordinate) => {
                    log::debug!("Resolved '{}' via {}", address, kind);
                    return Resolution {
                        resolved: Some((kind, coordinate)),
                        attempts,
                    };
                }
                AttemptOutcome::NoMatch => {
                    log::debug!("{} had no match for '{}'", kind, address);
                    attempts.push(ProviderAttempt {
                        provider: kind,
                        error: GeocodeError::NoMatch,
                    });
                }
                AttemptOutcome::Failed(error) => {
                    log::debug!("{} failed for '{}': {}", kind, address, error);
                    attempts.push(ProviderAttempt {
                        provider: kind,
                        error,
                    });
                }
            }
        }

        Resolution {
            resolved: None,
            attempts,
        }
    }
}

/// Build the effective chain `[preferred, photon, nominatim]`.
///
/// Duplicates are removed, and Mapbox is left out entirely without a token.
pub fn provider_chain(preferred: ProviderKind, mapbox_token: Option<&str>) -> Vec<Provider> {
    let order = [preferred, ProviderKind::Photon, ProviderKind::Nominatim];
    let mut seen: Vec<ProviderKind> = Vec::with_capacity(order.len());
    let mut chain = Vec::with_capacity(order.len());

    for kind in order {
        if seen.contains(&kind) {
            continue;
        }
        seen.push(kind);

        let provider = match kind {
            ProviderKind::Mapbox => match mapbox_token.filter(|t| !t.is_empty()) {
                Some(token) => Provider::Mapbox {
                    token: token.to_string(),
                },
                None => continue,
            },
            ProviderKind::Photon => Provider::Photon,
            ProviderKind::Nominatim => Provider::Nominatim,
        };
        chain.push(provider);
    }
    chain
}
