//! Throwaway signing identity that pays for and authorizes the token's own mint
//! operations.
//!
//! The orchestrator keeps only the [`ExportedKeypair`] snapshot between operations
//! and rebuilds the signer from it whenever an operation needs it.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{keypair_from_seed, Keypair, Signature, Signer};
use zeroize::Zeroizing;

use crate::error::{MintflowError, Result};

/// Secret (32) + public (32) halves, the layout `Keypair::to_bytes` produces.
pub const KEYPAIR_LEN: usize = 64;

/// Byte snapshot of an ephemeral keypair. Wiped from memory on drop.
#[derive(Clone)]
pub struct ExportedKeypair(Zeroizing<[u8; KEYPAIR_LEN]>);

impl ExportedKeypair {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEYPAIR_LEN] = bytes.try_into().map_err(|_| {
            MintflowError::InvalidKeypair(format!(
                "expected {} bytes, got {}",
                KEYPAIR_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(Zeroizing::new(array)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }

    /// Public half of the snapshot, readable without rebuilding the keypair.
    pub fn pubkey(&self) -> Pubkey {
        let mut public = [0u8; 32];
        public.copy_from_slice(&self.0[32..]);
        Pubkey::new_from_array(public)
    }
}

impl std::fmt::Debug for ExportedKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ExportedKeypair").field(&self.pubkey()).finish()
    }
}

impl PartialEq for ExportedKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for ExportedKeypair {}

// JSON array of byte values, the same shape `solana-keygen` writes.
impl Serialize for ExportedKeypair {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for ExportedKeypair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes = Zeroizing::new(Vec::<u8>::deserialize(deserializer)?);
        ExportedKeypair::from_bytes(&bytes).map_err(D::Error::custom)
    }
}

/// A locally generated mint authority.
pub struct EphemeralKeypair {
    keypair: Keypair,
}

impl EphemeralKeypair {
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.keypair.sign_message(message)
    }

    pub fn export(&self) -> ExportedKeypair {
        ExportedKeypair(Zeroizing::new(self.keypair.to_bytes()))
    }

    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string(&self.export())
            .map_err(|e| MintflowError::InvalidKeypair(e.to_string()))
    }
}

impl std::fmt::Debug for EphemeralKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeypair")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

impl PartialEq for EphemeralKeypair {
    fn eq(&self, other: &Self) -> bool {
        self.export() == other.export()
    }
}

/// Factory for ephemeral mint authorities.
pub struct EphemeralMintAuthority;

impl EphemeralMintAuthority {
    /// Fresh keypair from the OS random source.
    pub fn generate() -> EphemeralKeypair {
        EphemeralKeypair {
            keypair: Keypair::new(),
        }
    }

    /// Rebuild a keypair from its export. The public half must match the secret half.
    pub fn restore(exported: &ExportedKeypair) -> Result<EphemeralKeypair> {
        let keypair = keypair_from_seed(&exported.as_bytes()[..32])
            .map_err(|e| MintflowError::InvalidKeypair(e.to_string()))?;
        if keypair.pubkey() != exported.pubkey() {
            return Err(MintflowError::InvalidKeypair(
                "public key does not match secret key".to_string(),
            ));
        }
        Ok(EphemeralKeypair { keypair })
    }

    pub fn restore_bytes(bytes: &[u8]) -> Result<EphemeralKeypair> {
        Self::restore(&ExportedKeypair::from_bytes(bytes)?)
    }

    pub fn restore_json(json: &str) -> Result<EphemeralKeypair> {
        let exported: ExportedKeypair = serde_json::from_str(json)
            .map_err(|e| MintflowError::InvalidKeypair(e.to_string()))?;
        Self::restore(&exported)
    }
}
