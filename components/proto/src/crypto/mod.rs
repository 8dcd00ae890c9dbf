use common::define_fixed_bytes;

pub const HASH_RESULT_LEN: usize = 32;
define_fixed_bytes!(HashResult, HASH_RESULT_LEN);

/// An account address on the ledger.
pub const ADDRESS_LEN: usize = 20;
define_fixed_bytes!(Address, ADDRESS_LEN);

/// Address of a token contract.
pub type TokenAddress = Address;
/// Address of the token network contract managing all channels of one token.
pub type TokenNetworkAddress = Address;

pub const CHANNEL_ID_LEN: usize = 32;
// Identifies a channel. Never reused, even after the channel is settled.
define_fixed_bytes!(ChannelId, CHANNEL_ID_LEN);

pub const PUBLIC_KEY_LEN: usize = 32;
pub const PRIVATE_KEY_LEN: usize = 32;

define_fixed_bytes!(PublicKey, PUBLIC_KEY_LEN);
// ed25519 secret seed
define_fixed_bytes!(PrivateKey, PRIVATE_KEY_LEN);

/// A signature carries the signer's public key followed by the ed25519 signature itself,
/// allowing to recover the signer from a signed payload.
pub const SIGNATURE_LEN: usize = PUBLIC_KEY_LEN + 64;
define_fixed_bytes!(Signature, SIGNATURE_LEN);

pub type BlockNumber = u64;
