//! ENS name hashing ([EIP-137](https://eips.ethereum.org/EIPS/eip-137))

use alloy_primitives::{B256, keccak256};

/// Compute the ENS node for a dotted name.
///
/// The name is lowercased first; no other normalization is applied.
/// An empty name maps to the zero node.
pub fn namehash(name: &str) -> B256 {
    if name.is_empty() {
        return B256::ZERO;
    }

    let name = name.to_lowercase();

    // [node @ 0..32, label_hash @ 32..64]
    let mut buffer = [0u8; 64];
    for label in name.rsplit('.') {
        buffer[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        let node = keccak256(buffer);
        buffer[..32].copy_from_slice(node.as_slice());
    }

    B256::from_slice(&buffer[..32])
}
