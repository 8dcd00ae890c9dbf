use crypto::identity::recover_address;

use proto::balance::messages::BalanceProof;
use proto::crypto::Address;

use crate::signature_buff::balance_proof_signature_buff;

/// Recovers the address of the participant who signed a balance proof.
pub trait RecoverSigner {
    /// Returns `None` if the signature is invalid.
    fn recover_signer(&self, balance_proof: &BalanceProof) -> Option<Address>;
}

/// Recovers signers of ed25519 signed balance proofs.
#[derive(Debug, Clone, Default)]
pub struct Ed25519RecoverSigner;

impl RecoverSigner for Ed25519RecoverSigner {
    fn recover_signer(&self, balance_proof: &BalanceProof) -> Option<Address> {
        recover_balance_proof_signer(balance_proof)
    }
}

/// Recover the address that signed the given balance proof.
pub fn recover_balance_proof_signer(balance_proof: &BalanceProof) -> Option<Address> {
    let signature_buff = balance_proof_signature_buff(balance_proof);
    recover_address(&signature_buff, &balance_proof.signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crypto::identity::{Identity, SoftwareEd25519Identity};
    use proto::crypto::{ChannelId, HashResult, PrivateKey, Signature};

    use crate::signature_buff::sign_balance_proof;

    fn create_balance_proof() -> BalanceProof {
        BalanceProof {
            nonce: 5,
            transferred_amount: 30,
            channel_id: ChannelId::from(&[1; ChannelId::len()]),
            locksroot: HashResult::from(&[2; HashResult::len()]),
            additional_hash: HashResult::from(&[3; HashResult::len()]),
            signature: Signature::default(),
        }
    }

    #[test]
    fn test_recover_balance_proof_signer() {
        let private_key = PrivateKey::from(&[7; PrivateKey::len()]);
        let identity = SoftwareEd25519Identity::from_private_key(&private_key).unwrap();

        let mut balance_proof = create_balance_proof();
        sign_balance_proof(&identity, &mut balance_proof);

        let recover_signer = Ed25519RecoverSigner;
        assert_eq!(
            recover_signer.recover_signer(&balance_proof),
            Some(identity.get_address())
        );

        // Any change to the signed fields invalidates the signature:
        let mut changed = balance_proof.clone();
        changed.transferred_amount += 1;
        assert_eq!(recover_signer.recover_signer(&changed), None);

        let mut changed = balance_proof.clone();
        changed.nonce += 1;
        assert_eq!(recover_signer.recover_signer(&changed), None);

        let mut changed = balance_proof;
        changed.locksroot = HashResult::from(&[9; HashResult::len()]);
        assert_eq!(recover_signer.recover_signer(&changed), None);
    }

    #[test]
    fn test_recover_unsigned_balance_proof() {
        assert_eq!(recover_balance_proof_signer(&create_balance_proof()), None);
    }
}
