// # enscid-core
//
// Core library for pointing an ENS name's contenthash at an IPFS CID.
//
// ## Architecture Overview
//
// - **namehash**: EIP-137 node computation
// - **contenthash**: CID normalization and EIP-1577 encoding
// - **retry**: Bounded exponential backoff for transient RPC failures
// - **ens**: Registry/resolver bindings and resolver lookup
// - **ChainClient**: Trait for JSON-RPC reads, signed writes and receipts
// - **ContenthashUpdater**: Orchestrates the read → compare → write → confirm flow
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Encoding and orchestration are separate from RPC transport
// 2. **Idempotency**: The on-chain record is compared before anything is written
// 3. **Library-First**: The binary only parses the environment and wires things up
// 4. **Explicit Configuration**: Settings are captured once and passed in, never read ad hoc

pub mod config;
pub mod contenthash;
pub mod ens;
pub mod error;
pub mod namehash;
pub mod retry;
pub mod traits;
pub mod updater;

// Re-export core types for convenience
pub use config::{LogLevel, PrivateKey, UpdateConfig};
pub use contenthash::EncodedContenthash;
pub use error::{Error, Result, RpcFailure};
pub use namehash::namehash;
pub use retry::{RetryPolicy, with_rpc_retry};
pub use traits::{ChainClient, Receipt};
pub use updater::{ContenthashUpdater, UpdateEvent, UpdateOutcome};
