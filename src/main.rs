use anyhow::Context;
use clap::Parser;
use site_geocoder::config::Cfg;
use site_geocoder::geocode::{AddressResolver, ResultCache, UreqClient};
use site_geocoder::pipeline::{self, RunOptions};
use site_geocoder::sites;
use std::path::PathBuf;
use std::time::Duration;

/// Geocode site addresses for offline marker placement.
///
/// Addresses already present in the output file are never queried again.
/// The rest go through the provider chain [preferred, photon, nominatim],
/// one request at a time.
///
/// Examples:
///   geocode-sites
///   geocode-sites --provider nominatim
///   MAPBOX_TOKEN=pk.xxx geocode-sites --provider mapbox
///   geocode-sites --offline --json
#[derive(Parser)]
#[command(name = "geocode-sites", version, about, long_about = None)]
struct Cli {
    /// Site feed to read addresses from.
    #[arg(long)]
    sites: Option<PathBuf>,

    /// Output file; also read as the cache of earlier runs.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Preferred provider: mapbox, photon or nominatim.
    /// Overrides GEOCODER_PROVIDER.
    #[arg(long)]
    provider: Option<String>,

    /// Mapbox access token, overriding MAPBOX_TOKEN.
    /// Without a token Mapbox is never queried.
    #[arg(long)]
    mapbox_token: Option<String>,

    /// Pause after each network lookup, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Offline mode: only use the existing output file.
    #[arg(long)]
    offline: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn into_cfg(self) -> (Cfg, bool) {
        let mut cfg = Cfg::from_env_or_default();
        if let Some(path) = self.sites {
            cfg.sites_path = path;
        }
        if let Some(path) = self.output {
            cfg.output_path = path;
        }
        if let Some(provider) = self.provider {
            cfg.set_provider(&provider);
        }
        if let Some(token) = self.mapbox_token {
            cfg.set_mapbox_token(&token);
        }
        if let Some(ms) = self.delay_ms {
            cfg.request_delay = Duration::from_millis(ms);
        }
        cfg.offline = self.offline;
        (cfg, self.json)
    }
}

fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Warning: cannot load .env: {}", err);
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (cfg, json) = Cli::parse().into_cfg();

    match run(&cfg) {
        Ok(report) => {
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("{}", report);
            }
        }
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}

fn run(cfg: &Cfg) -> anyhow::Result<pipeline::RunReport> {
    let addresses = sites::load_addresses(&cfg.sites_path)?;
    log::info!(
        "Loaded {} distinct addresses from {}",
        addresses.len(),
        cfg.sites_path.display()
    );

    let client = UreqClient::new(cfg.request_timeout);
    let resolver = AddressResolver::new(client, cfg.provider_chain(), cfg.user_agent.as_str());
    let names: Vec<&str> = resolver.chain().iter().map(|p| p.kind().as_str()).collect();
    log::info!("Provider chain: {}", names.join(" -> "));
    let cache = ResultCache::new(&cfg.output_path);
    let options = RunOptions {
        delay: cfg.request_delay,
        offline: cfg.offline,
    };

    pipeline::run(&addresses, &cache, &resolver, &options)
        .with_context(|| format!("writing {}", cfg.output_path.display()))
}
