//! Address geocoding subsystem.
//!
//! Provides the result cache, the provider protocols (Mapbox, Photon,
//! Nominatim) and the fallback resolver that ties them together.

pub mod cache;
pub mod http;
pub mod providers;
pub mod resolver;
pub mod types;

pub use cache::{CacheError, ResultCache};
pub use http::{HttpClient, ProviderRequest, UreqClient};
pub use providers::{AttemptOutcome, Provider};
pub use resolver::{provider_chain, AddressResolver, Resolution};
pub use types::{Coordinate, GeocodeError, ProviderAttempt, ProviderKind, ResolvedRecord};
