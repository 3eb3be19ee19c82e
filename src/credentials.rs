use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Encrypts the stored personal access token.
///
/// Both directions are infallible: a value that cannot be encrypted is
/// stored as is, and a value that cannot be decrypted is returned unchanged
/// because it may predate encryption.
pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, plain_text: &str) -> String;
    fn decrypt(&self, encrypted_text: &str) -> String;
}

/// ChaCha20-Poly1305 keyed by a random secret kept next to the settings file
pub struct LocalKeyCipher {
    key_path: PathBuf,
}

impl LocalKeyCipher {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }

    #[cfg(test)]
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn read_key(&self) -> Result<ChaCha20Poly1305> {
        let bytes = fs::read(&self.key_path)
            .with_context(|| format!("Failed to read credential key {:?}", self.key_path))?;
        if bytes.len() != KEY_LEN {
            bail!("Credential key {:?} is corrupt", self.key_path);
        }
        ChaCha20Poly1305::new_from_slice(&bytes).map_err(|e| anyhow!("Invalid credential key: {e}"))
    }

    fn read_or_create_key(&self) -> Result<ChaCha20Poly1305> {
        if self.key_path.exists() {
            return self.read_key();
        }

        if let Some(parent) = self.key_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        write_private(&self.key_path, key.as_slice()).context("Failed to write credential key")?;

        tracing::info!(path = ?self.key_path, "created credential key");
        Ok(ChaCha20Poly1305::new(&key))
    }

    fn try_encrypt(&self, plain_text: &str) -> Result<String> {
        let cipher = self.read_or_create_key()?;
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plain_text.as_bytes())
            .map_err(|e| anyhow!("Encryption failed: {e}"))?;

        let mut payload = nonce.to_vec();
        payload.extend_from_slice(&sealed);
        Ok(STANDARD.encode(payload))
    }

    fn try_decrypt(&self, encrypted_text: &str) -> Result<String> {
        let payload = STANDARD
            .decode(encrypted_text)
            .context("Credential is not base64")?;
        if payload.len() <= NONCE_LEN {
            bail!("Credential payload too short");
        }

        let cipher = self.read_key()?;
        let (nonce, sealed) = payload.split_at(NONCE_LEN);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| anyhow!("Failed to decrypt credential"))?;
        String::from_utf8(plain).context("Decrypted credential is not UTF-8")
    }
}

/// Creates `path` readable by the owner only; never replaces an existing key
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl CredentialCipher for LocalKeyCipher {
    fn encrypt(&self, plain_text: &str) -> String {
        if plain_text.is_empty() {
            return String::new();
        }

        match self.try_encrypt(plain_text) {
            Ok(encrypted) => encrypted,
            Err(e) => {
                tracing::warn!(error = %e, "storing credential unencrypted");
                plain_text.to_string()
            }
        }
    }

    fn decrypt(&self, encrypted_text: &str) -> String {
        if encrypted_text.is_empty() {
            return String::new();
        }

        match self.try_decrypt(encrypted_text) {
            Ok(plain) => plain,
            Err(e) => {
                tracing::debug!(error = %e, "credential kept as stored");
                encrypted_text.to_string()
            }
        }
    }
}

/// Stores credentials as given
#[cfg(test)]
pub struct PlainText;

#[cfg(test)]
impl CredentialCipher for PlainText {
    fn encrypt(&self, plain_text: &str) -> String {
        plain_text.to_string()
    }

    fn decrypt(&self, encrypted_text: &str) -> String {
        encrypted_text.to_string()
    }
}
