//! IPFS contenthash encoding ([EIP-1577](https://eips.ethereum.org/EIPS/eip-1577))
//!
//! A contenthash record is the multicodec of the namespace followed by the
//! binary CIDv1 of the content. For IPFS that is `0xe3 0x01` (`ipfs-ns`,
//! varint encoded) and then `0x01 0x70 0x12 0x20 <sha2-256 digest>`.
//!
//! Only CIDs that have a CIDv0 form are published: CIDv0 itself, or CIDv1 with
//! the dag-pb codec over a sha2-256 multihash. Anything else is rejected with
//! [`Error::UnsupportedCid`].

use alloy_primitives::Bytes;
use cid::{Cid, Version};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Multicodec prefix for the IPFS namespace (`0xe3`, varint encoded)
const IPFS_NS_PREFIX: [u8; 2] = [0xe3, 0x01];

/// Multicodec code for dag-pb
const DAG_PB: u64 = 0x70;

/// Multihash code for sha2-256
const SHA2_256: u64 = 0x12;

/// An encoded contenthash together with the CID it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContenthash {
    /// The CID as supplied by the caller
    pub original: String,
    /// The CID that was actually encoded
    pub cid: String,
    /// Whether a CIDv1 was converted to CIDv0 first
    pub converted: bool,
    /// Binary record ready for `setContenthash`
    pub record: Bytes,
}

/// Encode an IPFS CID as an EIP-1577 contenthash record.
///
/// # Errors
///
/// - [`Error::UnsupportedCid`] if the input is a CIDv1 without a CIDv0 form,
///   or is not a CID at all
pub fn encode(input: &str) -> Result<EncodedContenthash> {
    let cid = normalize(input)?;
    let converted = cid != input;

    info!("Original CID: {}", input);
    if converted {
        info!("Converted to CIDv0: {}", cid);
    }

    let record = encode_ipfs_ns(&cid)?;

    Ok(EncodedContenthash {
        original: input.to_string(),
        cid,
        converted,
        record,
    })
}

/// Bring a CID into the form the IPFS namespace encoder accepts.
///
/// Unparseable input is passed through untouched so that
/// [`encode_ipfs_ns`] reports the parse failure.
fn normalize(input: &str) -> Result<String> {
    match Cid::try_from(input) {
        Ok(parsed) if parsed.version() == Version::V1 => Ok(to_v0(&parsed)?.to_string()),
        Ok(_) => Ok(input.to_string()),
        Err(e) => {
            debug!("Input {:?} did not parse as a CID: {}", input, e);
            Ok(input.to_string())
        }
    }
}

/// Convert a CIDv1 to CIDv0.
///
/// Only dag-pb content addressed by a 32-byte sha2-256 digest has a CIDv0 form.
fn to_v0(cid: &Cid) -> Result<Cid> {
    if cid.codec() != DAG_PB {
        return Err(Error::unsupported_cid(format!(
            "{} is CIDv1 with codec 0x{:x} and cannot be converted to CIDv0; \
             provide a dag-pb CID with sha2-256, or a CIDv0 (Qm...)",
            cid,
            cid.codec()
        )));
    }

    let hash = cid.hash();
    if hash.code() != SHA2_256 || hash.size() != 32 {
        return Err(Error::unsupported_cid(format!(
            "{} is CIDv1 with multihash 0x{:x} and cannot be converted to CIDv0; \
             provide a dag-pb CID with sha2-256, or a CIDv0 (Qm...)",
            cid,
            hash.code()
        )));
    }

    Cid::new_v0(*hash).map_err(|e| {
        Error::unsupported_cid(format!("{} cannot be converted to CIDv0: {}", cid, e))
    })
}

/// Encode a CID under the IPFS contenthash namespace.
fn encode_ipfs_ns(cid: &str) -> Result<Bytes> {
    let parsed = Cid::try_from(cid)
        .map_err(|e| Error::unsupported_cid(format!("invalid IPFS CID {:?}: {}", cid, e)))?;
    let v1 = parsed
        .into_v1()
        .map_err(|e| Error::unsupported_cid(format!("{} has no CIDv1 form: {}", cid, e)))?;

    let mut record = IPFS_NS_PREFIX.to_vec();
    record.extend_from_slice(&v1.to_bytes());
    Ok(Bytes::from(record))
}
