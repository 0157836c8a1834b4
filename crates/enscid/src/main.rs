// # enscid - ENS contenthash updater
//
// This is a THIN integration layer. Encoding, comparison and retry logic live
// in enscid-core; RPC transport lives in enscid-rpc-alloy.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the chain client
// 4. Running one update and reporting the outcome
//
// ## Configuration
//
// ### Target
// - `ENS_NAME`: ENS name to update (e.g. `site.eth`)
// - `IPFS_CID`: CID to publish (v0 or v1)
//
// ### Chain
// - `ETHEREUM_RPC_URL`: Primary JSON-RPC endpoint
// - `ETHEREUM_RPC_URLS`: Comma-separated endpoints (optional, overrides the above)
// - `ENS_PRIVATE_KEY`: Signing key of the name's manager
// - `ENS_REGISTRY_ADDRESS`: Registry override for test networks (optional)
//
// ### Retry
// - `ENS_RPC_MAX_ATTEMPTS`: Attempts per RPC call (default 5)
// - `ENS_RPC_BASE_DELAY_MS`: First backoff delay (default 1000)
// - `ENS_RPC_MAX_DELAY_MS`: Backoff cap (default 10000)
//
// ### Behaviour
// - `ENS_MODE`: `live` (default) or `dry-run`
// - `ENS_RECEIPT_TIMEOUT_SECS`: Stop waiting for a receipt after this long (optional)
// - `ENS_RECEIPT_POLL_MS`: Receipt polling interval (default 2000)
// - `ENS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ENS_NAME=site.eth
// export IPFS_CID=bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi
// export ETHEREUM_RPC_URL=https://mainnet.example.org
// export ENS_PRIVATE_KEY=0x...
//
// enscid
// ```

use anyhow::Result;
use enscid_core::{ContenthashUpdater, LogLevel, UpdateConfig, UpdateOutcome};
use enscid_rpc_alloy::AlloyChainClient;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Update applied, already up to date, or dry run
/// - 1: Configuration or startup error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy)]
enum EnscidExitCode {
    /// Run completed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (RPC, resolver, revert...)
    RuntimeError = 2,
}

impl From<EnscidExitCode> for ExitCode {
    fn from(code: EnscidExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let config = match UpdateConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return EnscidExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing_level(config.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return EnscidExitCode::ConfigError.into();
    }

    info!("Starting enscid for {}", config.name);
    if config.dry_run {
        info!("Dry-run mode: no transaction will be sent");
    }

    let client = match AlloyChainClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return EnscidExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return EnscidExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(client, config).await {
            Ok(()) => EnscidExitCode::Success,
            Err(e) => {
                eprintln!("{}", e);
                error!("Update failed: {}", e);
                EnscidExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one update
async fn run(client: AlloyChainClient, config: UpdateConfig) -> Result<()> {
    let (updater, mut events) = ContenthashUpdater::new(Box::new(client), &config)?;

    let event_logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Update event: {:?}", event);
        }
    });

    let outcome = updater.run().await;

    // Dropping the updater closes the channel and lets the logger finish
    drop(updater);
    let _ = event_logger.await;

    match outcome? {
        UpdateOutcome::Unchanged { .. } => info!("Nothing to do"),
        UpdateOutcome::DryRun { record, .. } => {
            info!("Dry run complete, would have written {} bytes", record.len())
        }
        UpdateOutcome::Updated { tx_hash, block_number, .. } => {
            info!("Updated {} in tx {} (block {})", config.name, tx_hash, block_number)
        }
    }

    Ok(())
}
