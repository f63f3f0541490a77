//! Incremental geocoder for site address feeds.
//!
//! Reads the addresses of a site feed, resolves the ones not already in the
//! output file through a fallback chain of geocoding providers, and rewrites
//! the output with the merged result.

pub mod config;
pub mod geocode;
pub mod pipeline;
pub mod sites;
