// # tsdns - publish tailnet peers as DNS records
//
// Thin integration layer: parses flags, installs logging, registers the
// Cloudflare provider and the Tailscale peer sources, then runs one
// reconciliation pass and exits.
//
// ## Configuration
//
// Every flag also reads a `TSDNS_*` environment variable. The Cloudflare
// API token is read from `CLOUDFLARE_API_TOKEN` only.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
// tsdns --zone example.com --subdomain wg --remove-orphans \
//     --alias 'gateway=vpn,router'
// ```

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use tsdns_core::{
    PeerSourceConfig, ProviderConfig, ProviderRegistry, SyncConfig, SyncEngine, ZoneDescriptor,
};

/// Environment variable holding the Cloudflare API token
const TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

/// Exit codes for different termination scenarios
///
/// - 0: Every change applied
/// - 1: Configuration or startup error, nothing changed
/// - 2: Runtime error (roster, provider), possibly after partial changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TsdnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<TsdnsExitCode> for ExitCode {
    fn from(code: TsdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Publish Tailscale peers as Cloudflare DNS records.
#[derive(Parser, Debug)]
#[command(name = "tsdns")]
#[command(version, about, long_about = None)]
struct Args {
    /// Cloudflare zone, e.g. example.com
    #[arg(long, env = "TSDNS_ZONE")]
    zone: String,

    /// Subdomain under the zone; 'wg' yields <host>.wg.example.com
    #[arg(long, env = "TSDNS_SUBDOMAIN")]
    subdomain: Option<String>,

    /// Only publish peers carrying this tag, e.g. tag:server
    #[arg(long, env = "TSDNS_TAG")]
    tag: Option<String>,

    /// Remove managed records that have no matching peer
    #[arg(long, env = "TSDNS_REMOVE_ORPHANS")]
    remove_orphans: bool,

    /// Remove every managed A/AAAA record and exit
    #[arg(long, env = "TSDNS_REMOVE_ALL")]
    remove_all: bool,

    /// Extra names for a host, "host=alias1,alias2" (repeatable)
    #[arg(long = "alias", env = "TSDNS_ALIAS", value_delimiter = ';')]
    aliases: Vec<String>,

    /// Cloudflare zone ID; skips the zone lookup
    #[arg(long, env = "TSDNS_ZONE_ID")]
    zone_id: Option<String>,

    /// Read `tailscale status --json` output from this file instead of running tailscale
    #[arg(long, env = "TSDNS_STATUS_FILE", conflicts_with = "tailscale_bin")]
    status_file: Option<String>,

    /// Path to the tailscale binary
    #[arg(long, env = "TSDNS_TAILSCALE_BIN")]
    tailscale_bin: Option<String>,

    /// Log intended changes without making them
    #[arg(long, env = "TSDNS_DRY_RUN")]
    dry_run: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "TSDNS_LOG_LEVEL", default_value = "info")]
    log_level: Level,
}

impl Args {
    fn sync_config(&self) -> SyncConfig {
        let mut zone = ZoneDescriptor::new(self.zone.trim());
        if let Some(sub) = self.subdomain.as_deref().map(str::trim)
            && !sub.is_empty()
        {
            zone = zone.with_subdomain(sub);
        }
        if let Some(tag) = self.tag.as_deref().map(str::trim)
            && !tag.is_empty()
        {
            zone = zone.with_tag(tag);
        }

        self.aliases.iter().fold(
            SyncConfig::new(zone)
                .with_remove_all(self.remove_all)
                .with_remove_orphans(self.remove_orphans),
            |config, alias| config.with_alias(alias.as_str()),
        )
    }

    fn peer_source_config(&self) -> PeerSourceConfig {
        match &self.status_file {
            Some(path) => PeerSourceConfig::File { path: path.clone() },
            None => PeerSourceConfig::Tailscale {
                binary: self.tailscale_bin.clone(),
            },
        }
    }

    fn provider_config(&self, api_token: Option<String>) -> Result<ProviderConfig> {
        let api_token = api_token
            .filter(|t| !t.trim().is_empty())
            .with_context(|| {
                format!("{} is required. Set it via: export {}=your_token", TOKEN_ENV, TOKEN_ENV)
            })?;

        Ok(ProviderConfig::Cloudflare {
            api_token,
            zone_id: self.zone_id.clone(),
            dry_run: self.dry_run,
        })
    }
}

fn build_registry() -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    #[cfg(feature = "cloudflare")]
    tsdns_provider_cloudflare::register(&registry);

    #[cfg(feature = "tailscale")]
    tsdns_peer_tailscale::register(&registry);

    registry
}

/// Assemble the engine; any failure here is a configuration error
fn build_engine(args: &Args, registry: &ProviderRegistry) -> Result<SyncEngine> {
    let config = args.sync_config();
    config.validate().context("Invalid configuration")?;

    let provider_config = args.provider_config(std::env::var(TOKEN_ENV).ok())?;
    let provider = registry
        .create_provider(&provider_config)
        .context("Failed to create DNS provider")?;
    let peer_source = registry
        .create_peer_source(&args.peer_source_config())
        .context("Failed to create peer source")?;

    Ok(SyncEngine::new(peer_source, provider, config)?)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TsdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TsdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(args)).into()
}

async fn run(args: Args) -> TsdnsExitCode {
    let registry = build_registry();

    let engine = match build_engine(&args, &registry) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return TsdnsExitCode::ConfigError;
        }
    };

    info!(
        "Starting tsdns for {} ({} mode{})",
        engine.config().zone,
        engine.config().mode().as_str(),
        if args.dry_run { ", dry-run" } else { "" }
    );

    match engine.run().await {
        Ok(report) => {
            info!("Done: {}", report);
            TsdnsExitCode::Success
        }
        Err(e) => {
            error!("Run failed: {}", e);
            for action in e.applied() {
                warn!("Applied before failure: {}", action);
            }
            TsdnsExitCode::RuntimeError
        }
    }
}
