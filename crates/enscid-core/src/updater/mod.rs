//! Contenthash updater
//!
//! The ContenthashUpdater is responsible for:
//! - Computing the ENS node for the configured name
//! - Locating the resolver through the ENS registry
//! - Reading the current contenthash and encoding the target one
//! - Submitting `setContenthash` only when the two differ
//! - Waiting for the transaction to be confirmed
//!
//! ## Flow
//!
//! ```text
//! Start ─▶ NodeComputed ─▶ ResolverLocated ─▶ CurrentRead ─▶ TargetEncoded
//!                                                                 │
//!                                      ┌──────────────────────────┤
//!                                      ▼                          ▼
//!                                  Unchanged             Submitted ─▶ Confirmed
//! ```
//!
//! Only the individual RPC calls are retried (see [`crate::retry`]); the
//! flow as a whole runs exactly once. A failed read of the current
//! contenthash is treated as an empty record so that a first publish is
//! never blocked by it. This can make an unreadable resolver look like a
//! name without a contenthash; the write that follows is still validated
//! on chain.

use alloy_primitives::{Address, B256, Bytes, TxHash, hex};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::UpdateConfig;
use crate::contenthash;
use crate::ens;
use crate::error::{Error, Result};
use crate::namehash::namehash;
use crate::retry::{RetryPolicy, with_rpc_retry};
use crate::traits::ChainClient;

/// Capacity of the event channel returned by [`ContenthashUpdater::new`]
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Events emitted by the ContenthashUpdater
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    /// ENS node computed from the name
    NodeComputed { name: String, node: B256 },

    /// Resolver found in the registry
    ResolverLocated { resolver: Address },

    /// Current contenthash read (`degraded` if the read failed and was
    /// replaced by an empty record)
    CurrentRead { current: Bytes, degraded: bool },

    /// Target record encoded from the CID
    TargetEncoded {
        cid: String,
        converted: bool,
        record: Bytes,
    },

    /// Current record already matches the target
    Unchanged { record: Bytes },

    /// Dry-run: the write was skipped
    DryRun { record: Bytes },

    /// Transaction accepted by the node
    Submitted { tx_hash: TxHash },

    /// Transaction included in a block
    Confirmed { tx_hash: TxHash, block_number: u64 },
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The resolver already held the target record; nothing was sent
    Unchanged {
        /// The record in place
        record: Bytes,
    },

    /// Dry-run mode: the record differs but no transaction was sent
    DryRun {
        /// The record currently stored (empty if none or unreadable)
        previous: Bytes,
        /// The record that would have been written
        record: Bytes,
    },

    /// The record was written and confirmed
    Updated {
        /// Transaction hash
        tx_hash: TxHash,
        /// Block the transaction was included in
        block_number: u64,
        /// The record stored before the update (empty if none or unreadable)
        previous: Bytes,
        /// The record now stored
        record: Bytes,
    },
}

/// Publishes a CID to an ENS name's contenthash record
///
/// ## Lifecycle
///
/// 1. Create with [`ContenthashUpdater::new()`]
/// 2. Call [`ContenthashUpdater::run()`] once
/// 3. Drop
///
/// ## Concurrency
///
/// A run awaits each network call in turn; no two calls are in flight at
/// the same time, and at most one transaction is submitted.
pub struct ContenthashUpdater {
    /// Chain access (reads, signing, receipts)
    client: Box<dyn ChainClient>,

    /// ENS name to update
    name: String,

    /// CID to publish
    cid: String,

    /// ENS registry contract
    registry: Address,

    /// Retry policy applied to each RPC call
    retry: RetryPolicy,

    /// Skip the write
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<UpdateEvent>,
}

impl ContenthashUpdater {
    /// Create a new updater
    ///
    /// # Parameters
    ///
    /// - `client`: Chain client implementation
    /// - `config`: Update configuration
    ///
    /// # Returns
    ///
    /// A tuple of (updater, event_receiver) where event_receiver yields update events
    pub fn new(
        client: Box<dyn ChainClient>,
        config: &UpdateConfig,
    ) -> Result<(Self, mpsc::Receiver<UpdateEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let updater = Self {
            client,
            name: config.name.clone(),
            cid: config.cid.clone(),
            registry: config.registry_address,
            retry: config.retry,
            dry_run: config.dry_run,
            event_tx: tx,
        };

        Ok((updater, rx))
    }

    /// Run the update once
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateOutcome)`: the record is (or, in dry-run mode, would be) in place
    /// - `Err(Error)`: a fatal error; nothing after the failing step was attempted
    pub async fn run(&self) -> Result<UpdateOutcome> {
        let node = namehash(&self.name);
        debug!("Node for {}: {}", self.name, node);
        self.emit_event(UpdateEvent::NodeComputed {
            name: self.name.clone(),
            node,
        });

        let resolver =
            ens::locate_resolver(self.client.as_ref(), self.registry, &self.name, node, &self.retry)
                .await?;
        info!("Resolver for {}: {}", self.name, resolver);
        self.emit_event(UpdateEvent::ResolverLocated { resolver });

        let (current, degraded) = self.read_current(resolver, node).await;
        self.emit_event(UpdateEvent::CurrentRead {
            current: current.clone(),
            degraded,
        });

        let target = contenthash::encode(&self.cid)?;
        self.emit_event(UpdateEvent::TargetEncoded {
            cid: target.cid.clone(),
            converted: target.converted,
            record: target.record.clone(),
        });

        if current == target.record {
            info!("No-op: {} already points to {}", self.name, self.cid);
            self.emit_event(UpdateEvent::Unchanged {
                record: target.record.clone(),
            });
            return Ok(UpdateOutcome::Unchanged {
                record: target.record,
            });
        }

        let encoded_hex = format!("0x{}", hex::encode(&target.record));
        info!("Updating {} contenthash to IPFS CID {}", self.name, self.cid);
        info!("Encoded contenthash (hex, 0x-prefixed) length={}", encoded_hex.len());
        info!("Encoded contenthash bytes length={}", target.record.len());

        if self.dry_run {
            warn!(
                "DRY-RUN: would call setContenthash({}, {}) on resolver {}",
                node, encoded_hex, resolver
            );
            self.emit_event(UpdateEvent::DryRun {
                record: target.record.clone(),
            });
            return Ok(UpdateOutcome::DryRun {
                previous: current,
                record: target.record,
            });
        }

        let calldata = ens::set_contenthash_calldata(node, &target.record);
        let tx_hash = with_rpc_retry(&self.retry, "resolver.setContenthash", || {
            self.client.send_transaction(resolver, calldata.clone())
        })
        .await?;
        info!("Submitted tx: {}", tx_hash);
        self.emit_event(UpdateEvent::Submitted { tx_hash });

        let receipt = self.client.wait_for_receipt(tx_hash).await?;
        let block_number = receipt.block_number.ok_or_else(|| {
            Error::rpc(format!("Receipt for {} has no block number", tx_hash))
        })?;

        if !receipt.success {
            return Err(Error::TransactionReverted {
                tx_hash: tx_hash.to_string(),
                block_number,
            });
        }

        info!("Confirmed in block {}", block_number);
        self.emit_event(UpdateEvent::Confirmed {
            tx_hash,
            block_number,
        });

        Ok(UpdateOutcome::Updated {
            tx_hash,
            block_number,
            previous: current,
            record: target.record,
        })
    }

    /// Read the current record, degrading any failure to an empty record
    async fn read_current(&self, resolver: Address, node: B256) -> (Bytes, bool) {
        match ens::read_contenthash(self.client.as_ref(), resolver, node, &self.retry).await {
            Ok(current) => {
                debug!("Current contenthash: 0x{}", hex::encode(&current));
                (current, false)
            }
            Err(e) => {
                warn!(
                    "Could not read current contenthash for {} via {}: {}. Treating it as empty",
                    self.name,
                    self.client.client_name(),
                    e
                );
                (Bytes::new(), true)
            }
        }
    }

    /// Emit an update event
    fn emit_event(&self, event: UpdateEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
