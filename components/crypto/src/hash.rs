use proto::crypto::HashResult;
use sha2::{Digest, Sha512Trunc256};

/// SHA512/256 digest, used for deriving addresses from public keys and for the domain prefix
/// of signed balance proofs.
pub fn hash_buffer(data: &[u8]) -> HashResult {
    let digest = Sha512Trunc256::digest(data);

    let mut inner = [0x00; HashResult::len()];
    inner.copy_from_slice(digest.as_ref());
    HashResult::from(&inner)
}
