//! Local auth gateway.
//!
//! Credentials are a YAML list at `<data_dir>/auth/credentials.yaml`:
//!
//! ```yaml
//! - email: carer@centre.org
//!   user_id: 4f1c2a0e9b7d4e7f8a1b2c3d4e5f6a7b
//!   salt: 9a0c…
//!   password_sha256: 3e1f…
//! ```
//!
//! The file is re-read on every sign-in so accounts added with the admin CLI take effect
//! without a restart. Issued tokens live only in memory.

use crate::error::{AuthError, AuthResult};
use crate::gateway::{AuthGateway, AuthTokens, SignedIn};
use crate::ids::UserId;
use bewell_types::EmailAddress;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CredentialEntry {
    email: String,
    user_id: UserId,
    salt: String,
    password_sha256: String,
}

#[derive(Debug)]
pub struct LocalAuthGateway {
    credentials_path: PathBuf,
    tokens: Mutex<HashMap<UserId, AuthTokens>>,
}

impl LocalAuthGateway {
    /// Opens the gateway. The credentials file need not exist yet.
    pub fn open(credentials_path: &Path) -> Self {
        Self {
            credentials_path: credentials_path.to_path_buf(),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a login for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyRegistered` if the email already has a login, or a
    /// credentials read/write error.
    pub fn register(
        &self,
        email: &EmailAddress,
        password: &str,
        user_id: &UserId,
    ) -> AuthResult<()> {
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let mut entries = self.load()?;
        if entries.iter().any(|e| e.email == email.as_str()) {
            return Err(AuthError::AlreadyRegistered);
        }

        let salt = random_hex(16);
        entries.push(CredentialEntry {
            email: email.as_str().to_string(),
            user_id: user_id.clone(),
            password_sha256: hash_password(&salt, password),
            salt,
        });

        self.save(&entries)
    }

    fn load(&self) -> AuthResult<Vec<CredentialEntry>> {
        match fs::read_to_string(&self.credentials_path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Vec::new()),
            Ok(contents) => serde_yaml::from_str(&contents).map_err(AuthError::CredentialsFormat),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(AuthError::CredentialsRead(e)),
        }
    }

    fn save(&self, entries: &[CredentialEntry]) -> AuthResult<()> {
        let yaml = serde_yaml::to_string(entries).map_err(AuthError::CredentialsFormat)?;
        if let Some(parent) = self.credentials_path.parent() {
            fs::create_dir_all(parent).map_err(AuthError::CredentialsWrite)?;
        }

        let tmp = self.credentials_path.with_extension("tmp");
        fs::write(&tmp, yaml).map_err(AuthError::CredentialsWrite)?;
        fs::rename(&tmp, &self.credentials_path).map_err(AuthError::CredentialsWrite)
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AuthGateway for LocalAuthGateway {
    fn sign_in(&self, email: &EmailAddress, password: &str) -> AuthResult<SignedIn> {
        let entries = self.load()?;
        let entry = entries
            .iter()
            .find(|e| e.email == email.as_str())
            .ok_or(AuthError::InvalidCredentials)?;

        if hash_password(&entry.salt, password) != entry.password_sha256 {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = AuthTokens {
            access_token: random_hex(32),
            refresh_token: random_hex(32),
        };
        self.tokens
            .lock()
            .map_err(|_| AuthError::LockPoisoned)?
            .insert(entry.user_id.clone(), tokens.clone());

        Ok(SignedIn {
            identity: entry.user_id.clone(),
            tokens,
        })
    }

    fn sign_out(&self, identity: &UserId) -> AuthResult<()> {
        self.tokens
            .lock()
            .map_err(|_| AuthError::LockPoisoned)?
            .remove(identity);
        Ok(())
    }

    fn restore_session(&self, tokens: &AuthTokens) -> AuthResult<()> {
        let issued = self.tokens.lock().map_err(|_| AuthError::LockPoisoned)?;
        let known = issued.values().any(|t| {
            t.access_token == tokens.access_token || t.refresh_token == tokens.refresh_token
        });

        if known {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}
