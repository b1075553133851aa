use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sesame_core::cipher::{CipherError, SessionCipher};
use sha2::Sha256;

/// PBKDF2 rounds used when no override is configured.
pub const DEFAULT_KDF_ITERATIONS: u32 = 10_000;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-256-GCM with a per-entry PBKDF2-SHA256 key.
///
/// Ciphertext is `base64(salt || nonce || sealed)`. Salt and nonce are drawn
/// fresh for every call to `encrypt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesGcmCipher {
    iterations: u32,
}

impl AesGcmCipher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for AesGcmCipher {
    fn default() -> Self {
        Self::new(DEFAULT_KDF_ITERATIONS)
    }
}

impl SessionCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String, CipherError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let cipher = build_cipher(secret, &salt, self.iterations)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encryption {
                reason: format!("encrypt failed: {e}"),
            })?;

        let mut envelope = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
        envelope.extend_from_slice(&salt);
        envelope.extend_from_slice(nonce.as_slice());
        envelope.extend_from_slice(&sealed);
        Ok(STANDARD.encode(envelope))
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<Vec<u8>, CipherError> {
        let envelope = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::Encoding {
                reason: e.to_string(),
            })?;

        let min_len = SALT_LEN + NONCE_LEN + TAG_LEN;
        if envelope.len() < min_len {
            return Err(CipherError::Malformed {
                reason: format!("expected at least {min_len} bytes, got {}", envelope.len()),
            });
        }

        let (salt, rest) = envelope.split_at(SALT_LEN);
        let (nonce, sealed) = rest.split_at(NONCE_LEN);
        let cipher = build_cipher(secret, salt, self.iterations)?;
        cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CipherError::Authentication)
    }
}

fn build_cipher(secret: &str, salt: &[u8], iterations: u32) -> Result<Aes256Gcm, CipherError> {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, iterations, &mut key);
    Aes256Gcm::new_from_slice(&key).map_err(|e| CipherError::Encryption {
        reason: format!("cipher init failed: {e}"),
    })
}
