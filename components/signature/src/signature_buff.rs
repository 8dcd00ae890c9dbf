use byteorder::{BigEndian, WriteBytesExt};

use crypto::hash;
use crypto::identity::Identity;

use proto::balance::messages::BalanceProof;

pub const BALANCE_PROOF_PREFIX: &[u8] = b"BALANCE_PROOF";

/// Create the buffer we sign over at a balance proof.
///
/// Signature{key=participant}(
///   hash("BALANCE_PROOF") ||
///   channelId ||
///   nonce ||
///   transferredAmount ||
///   locksroot ||
///   additionalHash
/// )
pub fn balance_proof_signature_buff(balance_proof: &BalanceProof) -> Vec<u8> {
    let mut sbuffer = Vec::new();

    sbuffer.extend_from_slice(&hash::hash_buffer(BALANCE_PROOF_PREFIX));
    sbuffer.extend_from_slice(&balance_proof.channel_id);
    // Writing into a Vec can not fail:
    let _ = sbuffer.write_u64::<BigEndian>(balance_proof.nonce);
    let _ = sbuffer.write_u128::<BigEndian>(balance_proof.transferred_amount);
    sbuffer.extend_from_slice(&balance_proof.locksroot);
    sbuffer.extend_from_slice(&balance_proof.additional_hash);

    sbuffer
}

/// Fill in the signature field of a balance proof.
pub fn sign_balance_proof<I>(identity: &I, balance_proof: &mut BalanceProof)
where
    I: Identity,
{
    let sbuffer = balance_proof_signature_buff(balance_proof);
    balance_proof.signature = identity.sign(&sbuffer);
}
