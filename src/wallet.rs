//! Wallet management module
//!
//! Signing material is read once from a keypair file at start-up and lives
//! only in memory for the rest of the run. File contents are zeroized as soon
//! as the keypair has been parsed.

use std::path::Path;

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use zeroize::Zeroizing;

/// A signing identity
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Load a keypair file
    ///
    /// Accepts the CLI's JSON array of 64 bytes, or the same 64 bytes raw.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_bytes = Zeroizing::new(
            std::fs::read(path)
                .with_context(|| format!("Failed to read keypair file: {}", path.display()))?,
        );

        let secret = if file_bytes.len() == 64 {
            Zeroizing::new(file_bytes.to_vec())
        } else {
            Zeroizing::new(
                serde_json::from_slice::<Vec<u8>>(&file_bytes)
                    .context("Failed to parse keypair JSON")?,
            )
        };

        Self::from_secret_bytes(&secret)
            .with_context(|| format!("Invalid keypair in {}", path.display()))
    }

    /// Build from the 64 secret bytes (secret key followed by public key)
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 64 {
            anyhow::bail!("Invalid keypair length: expected 64 bytes, got {}", bytes.len());
        }
        if bytes.iter().all(|&b| b == 0) {
            anyhow::bail!("Invalid keypair: all-zero key rejected");
        }
        let keypair = Keypair::try_from(bytes).context("Invalid keypair bytes")?;
        Ok(Self { keypair })
    }

    /// Fresh random identity, e.g. for a new mint account
    pub fn generate() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn test_load_json_keypair() {
        let keypair = Keypair::new();
        let json = serde_json::to_vec(&keypair.to_bytes().to_vec()).unwrap();
        let file = write_temp(&json);

        let wallet = Wallet::from_file(file.path()).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_load_raw_keypair() {
        let keypair = Keypair::new();
        let file = write_temp(&keypair.to_bytes());

        let wallet = Wallet::from_file(file.path()).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let file = write_temp(b"[1,2,3]");
        let err = Wallet::from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("expected 64 bytes"));
    }

    #[test]
    fn test_rejects_all_zero() {
        let file = write_temp(&serde_json::to_vec(&vec![0u8; 64]).unwrap());
        let err = Wallet::from_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("all-zero"));
    }

    #[test]
    fn test_missing_file() {
        let err = Wallet::from_file("/nonexistent/id.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read keypair file"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let wallet = Wallet::generate();
        let debug = format!("{:?}", wallet);
        assert!(debug.contains(&wallet.pubkey().to_string()));
        assert!(!debug.contains("secret"));
    }
}
