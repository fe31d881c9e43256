//! Pub identity persistence.

use super::ConfigError;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use ssb_proto::{PrivateIdentity, SEED_SIZE};
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Name of the identity file inside a config directory.
pub const IDENTITY_FILE: &str = "identity.toml";

#[derive(Serialize, Deserialize)]
struct IdentityFile {
    /// Base64 ed25519 seed.
    private_key: String,
}

/// Reads and writes the pub's private identity.
#[derive(Debug, Clone)]
pub struct IdentityStorage {
    path: PathBuf,
}

impl IdentityStorage {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(IDENTITY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<PrivateIdentity, ConfigError> {
        let content = Zeroizing::new(std::fs::read_to_string(&self.path)?);
        let file: IdentityFile = toml::from_str(&content)?;
        let private_key = Zeroizing::new(file.private_key);

        let bytes = Zeroizing::new(
            STANDARD
                .decode(private_key.trim())
                .map_err(|e| ConfigError::Invalid(format!("private_key: {}", e)))?,
        );
        let seed: Zeroizing<[u8; SEED_SIZE]> =
            Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
                ConfigError::Invalid(format!(
                    "private_key must be {} bytes, got {}",
                    SEED_SIZE,
                    bytes.len()
                ))
            })?);

        PrivateIdentity::from_seed(&seed)
            .map_err(|e| ConfigError::Invalid(format!("private_key: {}", e)))
    }

    /// Write the identity. The file is only readable by its owner.
    pub fn save(&self, identity: &PrivateIdentity) -> Result<(), ConfigError> {
        let file = IdentityFile {
            private_key: STANDARD.encode(identity.seed()),
        };
        let content = Zeroizing::new(toml::to_string(&file)?);
        let _private_key = Zeroizing::new(file.private_key);

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut out = options.open(&self.path)?;
        out.write_all(content.as_bytes())?;
        out.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = IdentityStorage::new(dir.path());
        assert!(!storage.exists());

        let identity = PrivateIdentity::generate().unwrap();
        storage.save(&identity).unwrap();

        assert!(storage.exists());
        assert_eq!(storage.load().unwrap().public(), identity.public());
    }

    #[cfg(unix)]
    #[test]
    fn identity_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = IdentityStorage::new(dir.path());
        storage.save(&PrivateIdentity::generate().unwrap()).unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn malformed_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = IdentityStorage::new(dir.path());

        std::fs::write(storage.path(), "private_key = \"c2hvcnQ=\"\n").unwrap();
        assert!(matches!(storage.load(), Err(ConfigError::Invalid(_))));

        std::fs::write(storage.path(), "private_key = 12\n").unwrap();
        assert!(matches!(storage.load(), Err(ConfigError::Parse(_))));
    }
}
