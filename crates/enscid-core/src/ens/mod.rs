//! ENS registry and resolver bindings
//!
//! Calldata is built here with `sol!` bindings and sent through a
//! [`ChainClient`], so the core never depends on a concrete provider.

use alloy_primitives::{Address, B256, Bytes, address};
use alloy_sol_types::{SolCall, sol};
use tracing::debug;

use crate::error::{Error, Result};
use crate::retry::{RetryPolicy, with_rpc_retry};
use crate::traits::ChainClient;

/// ENS registry deployment shared by mainnet and the public testnets
pub const ENS_REGISTRY_ADDRESS: Address = address!("00000000000c2e074ec69a0dfb2997ba6c7d2e1e");

sol! {
    /// ENS registry: maps nodes to owners and resolvers
    interface EnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    /// The subset of the public resolver used for contenthash records
    interface ContenthashResolver {
        function contenthash(bytes32 node) external view returns (bytes memory);
        function setContenthash(bytes32 node, bytes calldata hash) external;
    }
}

/// Look up the resolver bound to `node` in the ENS registry.
///
/// # Errors
///
/// - [`Error::NoResolver`] if the registry returns the zero address
/// - Any RPC error that survives retry
pub async fn locate_resolver(
    client: &dyn ChainClient,
    registry: Address,
    name: &str,
    node: B256,
    policy: &RetryPolicy,
) -> Result<Address> {
    let calldata = Bytes::from(EnsRegistry::resolverCall { node }.abi_encode());

    let returned = with_rpc_retry(policy, "registry.resolver", || {
        client.call(registry, calldata.clone())
    })
    .await?;

    let resolver = EnsRegistry::resolverCall::abi_decode_returns(&returned)?;
    if resolver.is_zero() {
        return Err(Error::NoResolver {
            name: name.to_string(),
        });
    }

    debug!("Registry {} returned resolver {} for {}", registry, resolver, name);
    Ok(resolver)
}

/// Read the contenthash currently stored on `resolver` for `node`.
pub async fn read_contenthash(
    client: &dyn ChainClient,
    resolver: Address,
    node: B256,
    policy: &RetryPolicy,
) -> Result<Bytes> {
    let calldata = Bytes::from(ContenthashResolver::contenthashCall { node }.abi_encode());

    let returned = with_rpc_retry(policy, "resolver.contenthash", || {
        client.call(resolver, calldata.clone())
    })
    .await?;

    Ok(ContenthashResolver::contenthashCall::abi_decode_returns(&returned)?)
}

/// Calldata for `setContenthash(node, record)`
pub fn set_contenthash_calldata(node: B256, record: &Bytes) -> Bytes {
    ContenthashResolver::setContenthashCall {
        node,
        hash: record.clone(),
    }
    .abi_encode()
    .into()
}
