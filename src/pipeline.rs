//! Batch driver: cache → resolver → merged output.
//!
//! Addresses are handled one at a time, in sorted order. Cached addresses
//! never touch the network; every other address is followed by a fixed
//! pause so providers see at most about one request per second.

use crate::geocode::{
    AddressResolver, CacheError, HttpClient, ProviderAttempt, ProviderKind, ResolvedRecord,
    ResultCache,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Pause after each address that needed the network.
    pub delay: Duration,
    /// Only use the cache; uncached addresses are reported unresolved.
    pub offline: bool,
}

/// An address that no provider could resolve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unresolved {
    pub address: String,
    pub attempts: Vec<ProviderAttempt>,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub total: usize,
    pub cached: usize,
    pub resolved: usize,
    /// Cache entries dropped because their address left the site feed.
    pub dropped: usize,
    pub written: usize,
    pub by_provider: Vec<(ProviderKind, usize)>,
    pub unresolved: Vec<Unresolved>,
}

impl RunReport {
    fn count_provider(&mut self, kind: ProviderKind) {
        match self.by_provider.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => self.by_provider.push((kind, 1)),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} addresses: {} cached, {} new, {} unresolved",
            self.total,
            self.cached,
            self.resolved,
            self.unresolved.len()
        )?;
        for (kind, n) in &self.by_provider {
            writeln!(f, "  {}: {}", kind, n)?;
        }
        for entry in &self.unresolved {
            let attempts: Vec<String> = entry.attempts.iter().map(ToString::to_string).collect();
            if attempts.is_empty() {
                writeln!(f, "  no result for {}", entry.address)?;
            } else {
                writeln!(f, "  no result for {} ({})", entry.address, attempts.join("; "))?;
            }
        }
        write!(f, "Wrote {} rows", self.written)
    }
}

/// Resolve `addresses`, merge with the cache and rewrite it.
///
/// Only a failure to write the output is an error.
pub fn run<C: HttpClient>(
    addresses: &[String],
    cache: &ResultCache,
    resolver: &AddressResolver<C>,
    options: &RunOptions,
) -> Result<RunReport, CacheError> {
    run_with_pause(addresses, cache, resolver, options, thread::sleep)
}

/// [`run`] with the pause between network lookups supplied by the caller.
pub fn run_with_pause<C, P>(
    addresses: &[String],
    cache: &ResultCache,
    resolver: &AddressResolver<C>,
    options: &RunOptions,
    mut pause: P,
) -> Result<RunReport, CacheError>
where
    C: HttpClient,
    P: FnMut(Duration),
{
    let existing = cache.load();
    let total = addresses.len();

    let mut report = RunReport {
        total,
        ..RunReport::default()
    };
    let mut rows = Vec::with_capacity(total);

    for (idx, address) in addresses.iter().enumerate() {
        if let Some(coordinate) = existing.get(address) {
            rows.push(ResolvedRecord::new(address.as_str(), *coordinate));
            report.cached += 1;
            continue;
        }

        if options.offline {
            report.unresolved.push(Unresolved {
                address: address.clone(),
                attempts: Vec::new(),
            });
            continue;
        }

        log::info!("[{}/{}] resolving {} ...", idx + 1, total, address);
        let resolution = resolver.resolve(address);
        match resolution.resolved {
            Some((kind, coordinate)) => {
                rows.push(ResolvedRecord::new(address.as_str(), coordinate));
                report.resolved += 1;
                report.count_provider(kind);
            }
            None => {
                let attempts: Vec<String> =
                    resolution.attempts.iter().map(ToString::to_string).collect();
                log::warn!(
                    "Failed to geocode {}; errors: [{}]",
                    address,
                    attempts.join(", ")
                );
                report.unresolved.push(Unresolved {
                    address: address.clone(),
                    attempts: resolution.attempts,
                });
            }
        }

        if !options.delay.is_zero() {
            pause(options.delay);
        }
    }

    let wanted: BTreeSet<&str> = addresses.iter().map(String::as_str).collect();
    report.dropped = existing
        .keys()
        .filter(|address| !wanted.contains(address.as_str()))
        .count();
    if report.dropped > 0 {
        log::info!(
            "Dropping {} cached addresses no longer in the site feed",
            report.dropped
        );
    }

    cache.save(&rows)?;
    report.written = rows.len();
    log::info!(
        "Wrote {} with {} rows ({} new)",
        cache.path().display(),
        report.written,
        report.resolved
    );
    Ok(report)
}
