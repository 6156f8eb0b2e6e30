//! Credential vault — AES-256-GCM protection for third-party AI API keys.
//!
//! Encrypts keys for storage in TEXT columns, validates provider-specific
//! key formats, and produces display-safe masked forms. Plaintext only
//! exists at the moment of use; nothing here caches it.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::keys::Provider;

/// Nonce size for AES-256-GCM (12 bytes).
const NONCE_SIZE: usize = 12;
/// AES-256 key size (32 bytes).
const KEY_SIZE: usize = 32;
/// GCM tag size (16 bytes).
const TAG_SIZE: usize = 16;

/// Minimum length of the configured encryption passphrase.
const MIN_PASSPHRASE_LEN: usize = 32;

/// Keys shorter than this mask to a constant placeholder.
const MASK_MIN_LEN: usize = 8;
/// Visible prefix/suffix length when masking.
const MASK_EDGE_LEN: usize = 4;

/// Display prefix length stored alongside encrypted keys.
pub const API_KEY_PREFIX_LENGTH: usize = 8;

/// Minimum length of a Gemini API key.
const GEMINI_MIN_LEN: usize = 30;
/// Literal prefix of an OpenAI API key.
const OPENAI_PREFIX: &str = "sk-";
/// Minimum length of an OpenAI API key.
const OPENAI_MIN_LEN: usize = 40;

/// Vault errors.
///
/// All decrypt-side failures (bad base64, wrong key, tampering, broken
/// envelope) fold into `Decryption` — callers need not distinguish, the
/// data is unusable either way and retrying cannot help.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

/// Encrypted API key payload: base64 ciphertext (with GCM tag) plus the
/// base64 nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedApiKey {
    pub ciphertext: String,
    pub iv: String,
}

/// Encrypts and decrypts API keys under a process-wide secret.
///
/// One instance per process, constructed at startup; a too-short
/// passphrase is a fatal configuration error, not a per-request one.
pub struct CredentialVault {
    key: [u8; KEY_SIZE],
}

impl CredentialVault {
    /// Build a vault from the configured passphrase.
    pub fn new(passphrase: &str) -> Result<Self, VaultError> {
        if passphrase.len() < MIN_PASSPHRASE_LEN {
            return Err(VaultError::Configuration(format!(
                "Encryption key must be at least {MIN_PASSPHRASE_LEN} characters long"
            )));
        }
        Ok(Self {
            key: derive_key(passphrase),
        })
    }

    /// Encrypt an API key with AES-256-GCM under a fresh random nonce.
    ///
    /// The nonce is never reused; two encryptions of the same plaintext
    /// produce unrelated ciphertexts.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedApiKey, VaultError> {
        use aes_gcm::aead::Aead;
        use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
        use base64::Engine;

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| VaultError::Encryption(format!("Key init failed: {e}")))?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Encryption(format!("Encryption failed: {e}")))?;

        let b64 = base64::engine::general_purpose::STANDARD;
        Ok(EncryptedApiKey {
            ciphertext: b64.encode(&ciphertext),
            iv: b64.encode(nonce_bytes),
        })
    }

    /// Decrypt an API key payload.
    pub fn decrypt(&self, encrypted: &EncryptedApiKey) -> Result<String, VaultError> {
        use aes_gcm::aead::Aead;
        use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
        use base64::Engine;

        let b64 = base64::engine::general_purpose::STANDARD;
        let nonce_bytes = b64
            .decode(&encrypted.iv)
            .map_err(|e| VaultError::Decryption(format!("Base64 decode failed: {e}")))?;
        let ciphertext = b64
            .decode(&encrypted.ciphertext)
            .map_err(|e| VaultError::Decryption(format!("Base64 decode failed: {e}")))?;

        if nonce_bytes.len() != NONCE_SIZE {
            return Err(VaultError::Decryption("Bad nonce length".into()));
        }
        if ciphertext.len() < TAG_SIZE {
            return Err(VaultError::Decryption("Ciphertext too short".into()));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| VaultError::Decryption(format!("Key init failed: {e}")))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_ref())
            .map_err(|_| VaultError::Decryption("Ciphertext rejected".into()))?;

        String::from_utf8(plaintext)
            .map_err(|e| VaultError::Decryption(format!("UTF-8 decode failed: {e}")))
    }

    /// Encrypt an API key into a single storable string (JSON envelope).
    pub fn encrypt_for_storage(&self, plaintext: &str) -> Result<String, VaultError> {
        let encrypted = self.encrypt(plaintext)?;
        serde_json::to_string(&encrypted)
            .map_err(|e| VaultError::Encryption(format!("Envelope encode failed: {e}")))
    }

    /// Decrypt an API key from its stored string form.
    pub fn decrypt_from_storage(&self, stored: &str) -> Result<String, VaultError> {
        let encrypted: EncryptedApiKey = serde_json::from_str(stored)
            .map_err(|e| VaultError::Decryption(format!("Envelope parse failed: {e}")))?;
        self.decrypt(&encrypted)
    }
}

/// Derive a 32-byte key from a passphrase using SHA-256.
fn derive_key(passphrase: &str) -> [u8; KEY_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    let result = hasher.finalize();
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&result);
    key
}

/// Syntactic check of an API key for a provider. Never errors.
pub fn validate_format(api_key: &str, provider: Provider) -> bool {
    match provider {
        Provider::Gemini => {
            api_key.len() >= GEMINI_MIN_LEN
                && api_key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        Provider::OpenAi => api_key.starts_with(OPENAI_PREFIX) && api_key.len() >= OPENAI_MIN_LEN,
    }
}

/// Mask an API key for display: fixed-length prefix and suffix around a
/// `*` interior. Inputs shorter than 8 characters get a constant
/// placeholder instead of a misleadingly short mask.
pub fn mask(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() < MASK_MIN_LEN {
        return "***".to_string();
    }
    let prefix: String = chars[..MASK_EDGE_LEN].iter().collect();
    let suffix: String = chars[chars.len() - MASK_EDGE_LEN..].iter().collect();
    let interior = "*".repeat(chars.len() - 2 * MASK_EDGE_LEN);
    format!("{prefix}{interior}{suffix}")
}

/// Display prefix kept alongside the encrypted key.
pub fn key_prefix(api_key: &str) -> String {
    api_key.chars().take(API_KEY_PREFIX_LENGTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSPHRASE: &str = "unit-test-passphrase-of-32-chars!!";

    fn vault() -> CredentialVault {
        CredentialVault::new(PASSPHRASE).unwrap()
    }

    #[test]
    fn short_passphrase_is_a_configuration_error() {
        assert!(matches!(
            CredentialVault::new("too-short"),
            Err(VaultError::Configuration(_))
        ));
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let v = vault();
        let plaintext = "sk-abcdEFGH1234ijklMNOP5678qrstUVWX9012yzab";
        let encrypted = v.encrypt(plaintext).unwrap();
        assert_eq!(v.decrypt(&encrypted).unwrap(), plaintext);
    }

    #[test]
    fn empty_plaintext_round_trips() {
        let v = vault();
        let encrypted = v.encrypt("").unwrap();
        assert_eq!(v.decrypt(&encrypted).unwrap(), "");
    }

    #[test]
    fn encryption_is_nondeterministic() {
        let v = vault();
        let a = v.encrypt("same-plaintext").unwrap();
        let b = v.encrypt("same-plaintext").unwrap();
        assert_ne!(a.iv, b.iv, "nonces must never repeat");
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn wrong_key_fails() {
        let encrypted = vault().encrypt("secret").unwrap();
        let other = CredentialVault::new("a-different-passphrase-32-chars!").unwrap();
        assert!(matches!(
            other.decrypt(&encrypted),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        use base64::Engine;
        let v = vault();
        let mut encrypted = v.encrypt("secret").unwrap();
        let b64 = base64::engine::general_purpose::STANDARD;
        let mut bytes = b64.decode(&encrypted.ciphertext).unwrap();
        bytes[0] ^= 0x01;
        encrypted.ciphertext = b64.encode(&bytes);
        assert!(matches!(
            v.decrypt(&encrypted),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn storage_round_trip() {
        let v = vault();
        let stored = v.encrypt_for_storage("AIzaSyA-fake-gemini-key-0123456789").unwrap();
        assert_eq!(
            v.decrypt_from_storage(&stored).unwrap(),
            "AIzaSyA-fake-gemini-key-0123456789"
        );
    }

    #[test]
    fn broken_envelope_folds_into_decryption_error() {
        let v = vault();
        assert!(matches!(
            v.decrypt_from_storage("not json at all"),
            Err(VaultError::Decryption(_))
        ));
        assert!(matches!(
            v.decrypt_from_storage(r#"{"ciphertext":"!!","iv":"!!"}"#),
            Err(VaultError::Decryption(_))
        ));
    }

    #[test]
    fn validate_format_vectors() {
        let openai_key = format!("sk-{}", "a".repeat(40));
        assert!(validate_format(&openai_key, Provider::OpenAi));
        assert!(!validate_format("notavalidkey", Provider::OpenAi));

        let gemini_key = "A1b2C3d4E5f6G7h8I9j0K1l2M3n4O5".to_string();
        assert_eq!(gemini_key.len(), 30);
        assert!(validate_format(&gemini_key, Provider::Gemini));
        assert!(!validate_format("short", Provider::Gemini));
        assert!(!validate_format(&format!("{gemini_key}!!"), Provider::Gemini));
        assert!(!validate_format("", Provider::Gemini));
    }

    #[test]
    fn mask_is_deterministic_and_lossy() {
        let key = "sk-abcdEFGH1234ijklMNOP5678qrstUVWX9012yzab";
        let masked = mask(key);
        assert_eq!(masked, mask(key));
        assert!(masked.starts_with("sk-a"));
        assert!(masked.ends_with("yzab"));
        assert_eq!(masked.len(), key.len());
        assert!(masked[4..masked.len() - 4].chars().all(|c| c == '*'));
    }

    #[test]
    fn short_inputs_mask_to_placeholder() {
        assert_eq!(mask(""), "***");
        assert_eq!(mask("sk-1234"), "***");
        // Just past the minimum, the real mask kicks in.
        assert_eq!(mask("sk-123456"), "sk-1*3456");
    }

    #[test]
    fn key_prefix_is_eight_chars() {
        assert_eq!(key_prefix("sk-abcdEFGH1234"), "sk-abcdE");
        assert_eq!(key_prefix("short"), "short");
    }
}
