//! Test doubles and common utilities for contract tests
//!
//! [`MockChainClient`] plays both the ENS registry and a single resolver in
//! memory. It decodes the calldata it receives, so the tests exercise the
//! real ABI encoding, and it counts every call the updater makes.

#![allow(dead_code)]

use alloy_primitives::{Address, B256, Bytes, TxHash, keccak256};
use alloy_sol_types::{SolCall, SolValue};
use enscid_core::ens::{ContenthashResolver, EnsRegistry, ENS_REGISTRY_ADDRESS};
use enscid_core::error::{Error, Result, RpcFailure};
use enscid_core::traits::{ChainClient, Receipt};
use enscid_core::{PrivateKey, UpdateConfig, UpdateEvent};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Resolver address used by the mock unless overridden
pub const RESOLVER: Address = Address::repeat_byte(0x42);

/// Block number reported in receipts
pub const BLOCK_NUMBER: u64 = 19_000_000;

/// A throwaway signing key
pub const TEST_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// The CIDv1 from the publishing scenario (dag-pb, sha2-256)
pub const SITE_CID_V1: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

/// A CIDv0 with a known EIP-1577 encoding
pub const SITE_CID_V0: &str = "QmRAQB6YaCyidP37UdDnjFY5vQuiBrcqdyoW1CuDgwxkD4";

struct MockState {
    registry: Address,
    resolver: Mutex<Address>,
    /// `None` makes `contenthash()` revert
    contenthash: Mutex<Option<Bytes>>,
    registry_failures: Mutex<VecDeque<RpcFailure>>,
    contenthash_failures: Mutex<VecDeque<RpcFailure>>,
    send_failures: Mutex<VecDeque<RpcFailure>>,
    receipt_success: Mutex<bool>,

    resolver_calls: AtomicUsize,
    contenthash_calls: AtomicUsize,
    send_calls: AtomicUsize,
    receipt_calls: AtomicUsize,

    queried_nodes: Mutex<Vec<B256>>,
    written_records: Mutex<Vec<(B256, Bytes)>>,
}

/// An in-memory ENS registry + resolver behind the ChainClient trait
///
/// Clones share state and counters, so a test can hand one clone to the
/// updater and keep another for assertions.
#[derive(Clone)]
pub struct MockChainClient {
    state: Arc<MockState>,
}

impl MockChainClient {
    /// Registry at the default address, resolver at [`RESOLVER`], no contenthash
    pub fn new() -> Self {
        Self::with_registry(ENS_REGISTRY_ADDRESS)
    }

    pub fn with_registry(registry: Address) -> Self {
        Self {
            state: Arc::new(MockState {
                registry,
                resolver: Mutex::new(RESOLVER),
                contenthash: Mutex::new(Some(Bytes::new())),
                registry_failures: Mutex::new(VecDeque::new()),
                contenthash_failures: Mutex::new(VecDeque::new()),
                send_failures: Mutex::new(VecDeque::new()),
                receipt_success: Mutex::new(true),
                resolver_calls: AtomicUsize::new(0),
                contenthash_calls: AtomicUsize::new(0),
                send_calls: AtomicUsize::new(0),
                receipt_calls: AtomicUsize::new(0),
                queried_nodes: Mutex::new(Vec::new()),
                written_records: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Unbind the resolver (registry returns the zero address)
    pub fn without_resolver(self) -> Self {
        *self.state.resolver.lock().unwrap() = Address::ZERO;
        self
    }

    /// Store a contenthash on the resolver
    pub fn with_contenthash(self, record: Bytes) -> Self {
        *self.state.contenthash.lock().unwrap() = Some(record);
        self
    }

    /// Make `contenthash()` revert
    pub fn with_unreadable_contenthash(self) -> Self {
        *self.state.contenthash.lock().unwrap() = None;
        self
    }

    /// Fail the next `registry.resolver()` calls, in order
    pub fn failing_registry_reads(self, failures: impl IntoIterator<Item = RpcFailure>) -> Self {
        self.state.registry_failures.lock().unwrap().extend(failures);
        self
    }

    /// Fail the next `resolver.contenthash()` calls, in order
    pub fn failing_contenthash_reads(self, failures: impl IntoIterator<Item = RpcFailure>) -> Self {
        self.state.contenthash_failures.lock().unwrap().extend(failures);
        self
    }

    /// Fail the next submissions, in order
    pub fn failing_sends(self, failures: impl IntoIterator<Item = RpcFailure>) -> Self {
        self.state.send_failures.lock().unwrap().extend(failures);
        self
    }

    /// Mine transactions with a failed status
    pub fn reverting(self) -> Self {
        *self.state.receipt_success.lock().unwrap() = false;
        self
    }

    pub fn resolver_call_count(&self) -> usize {
        self.state.resolver_calls.load(Ordering::SeqCst)
    }

    pub fn contenthash_call_count(&self) -> usize {
        self.state.contenthash_calls.load(Ordering::SeqCst)
    }

    pub fn send_call_count(&self) -> usize {
        self.state.send_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_call_count(&self) -> usize {
        self.state.receipt_calls.load(Ordering::SeqCst)
    }

    /// Nodes passed to `registry.resolver()`
    pub fn queried_nodes(&self) -> Vec<B256> {
        self.state.queried_nodes.lock().unwrap().clone()
    }

    /// `(node, record)` pairs written through `setContenthash`
    pub fn written_records(&self) -> Vec<(B256, Bytes)> {
        self.state.written_records.lock().unwrap().clone()
    }

    /// The record currently stored on the resolver
    pub fn stored_contenthash(&self) -> Option<Bytes> {
        self.state.contenthash.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChainClient for MockChainClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| Error::rpc("calldata too short"))?;

        if to == self.state.registry && selector == EnsRegistry::resolverCall::SELECTOR {
            self.state.resolver_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = pop(&self.state.registry_failures) {
                return Err(Error::Rpc(failure));
            }

            let call = EnsRegistry::resolverCall::abi_decode(&data)?;
            self.state.queried_nodes.lock().unwrap().push(call.node);

            let resolver = *self.state.resolver.lock().unwrap();
            return Ok(resolver.abi_encode().into());
        }

        if to == *self.state.resolver.lock().unwrap()
            && selector == ContenthashResolver::contenthashCall::SELECTOR
        {
            self.state.contenthash_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(failure) = pop(&self.state.contenthash_failures) {
                return Err(Error::Rpc(failure));
            }

            return match self.state.contenthash.lock().unwrap().clone() {
                Some(record) => Ok(record.abi_encode().into()),
                None => Err(Error::rpc("execution reverted")),
            };
        }

        Err(Error::rpc(format!("unexpected call to {}", to)))
    }

    async fn send_transaction(&self, to: Address, data: Bytes) -> Result<TxHash> {
        self.state.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = pop(&self.state.send_failures) {
            return Err(Error::Rpc(failure));
        }

        if to != *self.state.resolver.lock().unwrap() {
            return Err(Error::rpc(format!("unexpected transaction to {}", to)));
        }

        let call = ContenthashResolver::setContenthashCall::abi_decode(&data)?;
        self.state
            .written_records
            .lock()
            .unwrap()
            .push((call.node, call.hash.clone()));

        if *self.state.receipt_success.lock().unwrap() {
            *self.state.contenthash.lock().unwrap() = Some(call.hash);
        }

        Ok(keccak256(&data))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<Receipt> {
        self.state.receipt_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Receipt {
            tx_hash,
            block_number: Some(BLOCK_NUMBER),
            success: *self.state.receipt_success.lock().unwrap(),
        })
    }

    fn client_name(&self) -> &'static str {
        "mock"
    }
}

fn pop(queue: &Mutex<VecDeque<RpcFailure>>) -> Option<RpcFailure> {
    queue.lock().unwrap().pop_front()
}

/// Helper to create a minimal UpdateConfig for testing
pub fn test_config(name: &str, cid: &str) -> UpdateConfig {
    UpdateConfig::new(
        name,
        cid,
        vec!["https://rpc.invalid".to_string()],
        PrivateKey::parse(TEST_KEY).expect("test key is valid"),
    )
}

/// Drain every event emitted so far
pub fn drain_events(rx: &mut mpsc::Receiver<UpdateEvent>) -> Vec<UpdateEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A 429 from the HTTP layer
pub fn too_many_requests() -> RpcFailure {
    RpcFailure::http(429, "Too Many Requests", "HTTP error 429")
}
