// # Alloy Chain Client
//
// This crate provides the Ethereum JSON-RPC implementation of `ChainClient`
// used by the `enscid` binary.
//
// ## Capabilities
//
// - ✅ Read-only `eth_call` with in-order failover across every configured endpoint
// - ✅ Local private-key signing (nonce, gas and chain id filled by alloy)
// - ✅ Transaction submission through the primary endpoint
// - ✅ Receipt polling with an optional timeout
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ HTTP status, body and JSON-RPC error codes preserved for retry classification
// - ❌ NO retry logic (owned by `with_rpc_retry`)
// - ❌ NO backoff logic (owned by `with_rpc_retry`)
// - ❌ NO ABI encoding (owned by `enscid_core::ens`)
//
// ## Security Requirements
//
// - The private key NEVER appears in logs
// - The private key MUST be provided via environment variables only
// - Construction MUST fail fast if the key cannot be turned into a signer

use std::str::FromStr;
use std::time::Duration;

use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::Http;
use alloy::transports::{RpcError, TransportError, TransportErrorKind};
use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use enscid_core::traits::{ChainClient, Receipt};
use enscid_core::{Error, Result, RpcFailure, UpdateConfig};
use tracing::{debug, info, warn};

/// Default HTTP timeout for JSON-RPC requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain client backed by one or more JSON-RPC endpoints
///
/// The first endpoint is the primary: it carries the wallet and receives
/// every transaction. Reads try the endpoints in configuration order and
/// return the first successful answer.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the signer.
pub struct AlloyChainClient {
    /// Endpoint URLs, index-aligned with `providers`
    urls: Vec<String>,

    /// One provider per endpoint; `providers[0]` signs
    providers: Vec<DynProvider>,

    /// Address derived from the signing key
    sender: Address,

    /// Interval between receipt polls
    poll_interval: Duration,

    /// Give up waiting for a receipt after this long
    receipt_timeout: Option<Duration>,
}

// Custom Debug implementation that hides the signer
impl std::fmt::Debug for AlloyChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyChainClient")
            .field("urls", &self.urls)
            .field("sender", &self.sender)
            .field("signer", &"<REDACTED>")
            .field("poll_interval", &self.poll_interval)
            .field("receipt_timeout", &self.receipt_timeout)
            .finish()
    }
}

impl AlloyChainClient {
    /// Build a client from the updater configuration
    ///
    /// # Errors
    ///
    /// - `Error::Config` if no endpoint is configured, an endpoint is not a
    ///   valid URL, or the private key is not a valid secp256k1 scalar
    pub fn from_config(config: &UpdateConfig) -> Result<Self> {
        if config.rpc_urls.is_empty() {
            return Err(Error::config("At least one RPC URL is required"));
        }

        let signer = PrivateKeySigner::from_str(config.private_key.expose())
            .map_err(|e| Error::config(format!("ENS_PRIVATE_KEY is not a usable signing key: {}", e)))?;
        let sender = signer.address();
        let wallet = EthereumWallet::from(signer);

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        let mut providers = Vec::with_capacity(config.rpc_urls.len());
        for (index, raw) in config.rpc_urls.iter().enumerate() {
            let url = reqwest::Url::parse(raw)
                .map_err(|e| Error::config(format!("Invalid RPC URL '{}': {}", raw, e)))?;
            let rpc = RpcClient::new(Http::with_client(http.clone(), url), false);

            let provider = if index == 0 {
                ProviderBuilder::new()
                    .wallet(wallet.clone())
                    .connect_client(rpc)
                    .erased()
            } else {
                ProviderBuilder::new().connect_client(rpc).erased()
            };
            providers.push(provider);
        }

        info!(
            "Using {} RPC endpoint(s), sending from {}",
            providers.len(),
            sender
        );

        Ok(Self {
            urls: config.rpc_urls.clone(),
            providers,
            sender,
            poll_interval: Duration::from_millis(config.receipt_poll_interval_ms),
            receipt_timeout: config.receipt_timeout_secs.map(Duration::from_secs),
        })
    }

    /// Address transactions are sent from
    pub fn sender(&self) -> Address {
        self.sender
    }

    fn primary(&self) -> &DynProvider {
        // from_config guarantees at least one provider
        &self.providers[0]
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> Result<Receipt> {
        loop {
            match self.primary().get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    return Ok(Receipt {
                        tx_hash,
                        block_number: receipt.block_number(),
                        success: receipt.status(),
                    });
                }
                Ok(None) => debug!("Receipt for {} not available yet", tx_hash),
                Err(e) => {
                    let failure = rpc_failure(e);
                    if !failure.is_transient() {
                        return Err(Error::Rpc(failure));
                    }
                    warn!("Receipt poll for {} failed, will poll again: {}", tx_hash, failure);
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);

        let mut transient: Option<RpcFailure> = None;
        let mut last: Option<RpcFailure> = None;

        for (url, provider) in self.urls.iter().zip(&self.providers) {
            match provider.call(tx.clone()).await {
                Ok(returned) => return Ok(returned),
                Err(e) => {
                    let failure = rpc_failure(e);
                    debug!("eth_call to {} via {} failed: {}", to, url, failure);
                    if failure.is_transient() && transient.is_none() {
                        transient = Some(failure.clone());
                    }
                    last = Some(failure);
                }
            }
        }

        // A rate-limited endpoint is worth retrying even if a later one failed for good
        Err(Error::Rpc(
            transient
                .or(last)
                .unwrap_or_else(|| RpcFailure::message("no RPC endpoint answered")),
        ))
    }

    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.sender)
            .with_to(to)
            .with_input(data);

        let pending = self
            .primary()
            .send_transaction(tx)
            .await
            .map_err(|e| Error::Rpc(rpc_failure(e)))?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<Receipt> {
        match self.receipt_timeout {
            Some(limit) => tokio::time::timeout(limit, self.poll_receipt(tx_hash))
                .await
                .map_err(|_| Error::ReceiptTimeout {
                    tx_hash: tx_hash.to_string(),
                    secs: limit.as_secs(),
                })?,
            None => self.poll_receipt(tx_hash).await,
        }
    }

    fn client_name(&self) -> &'static str {
        "alloy"
    }
}

/// Map an alloy transport error, keeping whatever the caller needs to classify it
fn rpc_failure(err: TransportError) -> RpcFailure {
    match &err {
        RpcError::ErrorResp(payload) => {
            RpcFailure::json_rpc(payload.code, payload.message.to_string())
        }
        RpcError::Transport(TransportErrorKind::HttpError(http)) => {
            RpcFailure::http(http.status, http.body.clone(), err.to_string())
        }
        _ => RpcFailure::message(err.to_string()),
    }
}
