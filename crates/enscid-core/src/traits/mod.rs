//! Core traits for enscid
//!
//! - [`ChainClient`]: Read from and write to an Ethereum JSON-RPC endpoint

pub mod chain_client;

pub use chain_client::{ChainClient, Receipt};
