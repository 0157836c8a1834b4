// # Chain Client Trait
//
// Defines the interface for talking to an Ethereum JSON-RPC endpoint.
//
// ## Implementations
//
// - alloy-based, multi-endpoint: `enscid-rpc-alloy` crate
//
// ## Usage
//
// ```rust,ignore
// use enscid_core::ChainClient;
//
// #[tokio::main]
// async fn main() -> enscid_core::Result<()> {
//     let client = /* ChainClient implementation */;
//
//     // Read-only contract call
//     let returned = client.call(registry, calldata.into()).await?;
//
//     // State-changing call, then wait for inclusion
//     let tx_hash = client.send_transaction(resolver, calldata.into()).await?;
//     let receipt = client.wait_for_receipt(tx_hash).await?;
//
//     Ok(())
// }
// ```

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

/// Inclusion receipt for a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the transaction
    pub tx_hash: TxHash,
    /// Block the transaction was included in
    pub block_number: Option<u64>,
    /// Execution status (`false` means the transaction reverted)
    pub success: bool,
}

/// Trait for chain client implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// ## Allowed
/// - ✅ Perform JSON-RPC calls against the configured endpoints
/// - ✅ Fail over between endpoints for reads
/// - ✅ Sign transactions with the configured key
///
/// ## Forbidden
/// - ❌ Retry or back off on rate limiting (owned by `with_rpc_retry`)
/// - ❌ Decide whether an update is needed (owned by `ContenthashUpdater`)
/// - ❌ Encode contract calls (owned by the `ens` module)
///
/// Transport failures should be reported as [`crate::Error::Rpc`] with the
/// HTTP status and body filled in when known, so the caller can classify
/// them as transient.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Execute a read-only call (`eth_call`) against `to`
    ///
    /// # Returns
    ///
    /// - `Ok(Bytes)`: raw ABI-encoded return data
    /// - `Err(Error)`: the call failed or reverted
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, crate::Error>;

    /// Sign and submit a transaction calling `to` with `data`
    ///
    /// Returns as soon as the node accepted the transaction.
    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<TxHash, crate::Error>;

    /// Wait until the transaction is included in a block
    ///
    /// Implementations may enforce a timeout; without one this waits
    /// indefinitely.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<Receipt, crate::Error>;

    /// Get the client name (for logging/debugging)
    fn client_name(&self) -> &'static str;
}
