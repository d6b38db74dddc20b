//! AES-256-GCM sealed storage for the billing profile.
//!
//! The key is derived once from `PROFILE_PASSPHRASE` with Argon2 and a random
//! salt kept next to the sealed blob in `app_state`. Every write uses a fresh
//! nonce.

use crate::database::sqlite::{get_state, put_state};
use crate::database::stores::ConfidentialStore;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::Result;
use argon2::Argon2;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

const PROFILE_KEY: &str = "profile";
const SALT_KEY: &str = "profile_salt";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

#[derive(Debug, Serialize, Deserialize)]
struct SealedBlob {
    nonce: String,
    ciphertext: String,
}

pub struct EncryptedStateStore {
    pool: SqlitePool,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptedStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStateStore")
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}

impl EncryptedStateStore {
    pub async fn open(pool: SqlitePool, passphrase: &str) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(anyhow::anyhow!("Profile passphrase must not be empty"));
        }

        let salt = match get_state(&pool, SALT_KEY).await? {
            Some(encoded) => BASE64.decode(encoded)?,
            None => {
                let mut salt = vec![0u8; SALT_LEN];
                OsRng.fill_bytes(&mut salt);
                put_state(&pool, SALT_KEY, &BASE64.encode(&salt)).await?;
                salt
            }
        };

        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| anyhow::anyhow!("Key derivation failed: {e}"))?;

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| anyhow::anyhow!("Failed to create profile cipher: {e}"))?;

        Ok(Self { pool, cipher })
    }
}

#[async_trait]
impl ConfidentialStore for EncryptedStateStore {
    async fn get(&self) -> Result<Option<Vec<u8>>> {
        let Some(raw) = get_state(&self.pool, PROFILE_KEY).await? else {
            return Ok(None);
        };

        let sealed: SealedBlob = serde_json::from_str(&raw)?;
        let nonce = BASE64.decode(sealed.nonce)?;
        if nonce.len() != NONCE_LEN {
            return Err(anyhow::anyhow!("Stored profile has a malformed nonce"));
        }
        let ciphertext = BASE64.decode(sealed.ciphertext)?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
            .map_err(|_| {
                anyhow::anyhow!("Stored profile could not be decrypted. Check PROFILE_PASSPHRASE")
            })?;

        Ok(Some(plaintext))
    }

    async fn set(&self, blob: &[u8]) -> Result<()> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, blob)
            .map_err(|e| anyhow::anyhow!("Profile encryption failed: {e}"))?;

        let sealed = SealedBlob {
            nonce: BASE64.encode(nonce),
            ciphertext: BASE64.encode(ciphertext),
        };
        put_state(&self.pool, PROFILE_KEY, &serde_json::to_string(&sealed)?).await
    }
}
