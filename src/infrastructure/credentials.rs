use crate::domain::ports::CredentialHasher;
use sha2::{Digest, Sha256};

/// Salted SHA-256 credential hashing.
///
/// Hashes are stored as `salt$hexdigest`, with a fresh random salt per
/// credential.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }

    fn digest(salt: &str, credential: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(credential.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, credential: &str) -> String {
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let digest = Self::digest(&salt, credential);
        format!("{salt}${digest}")
    }

    fn verify(&self, credential: &str, hash: &str) -> bool {
        match hash.split_once('$') {
            Some((salt, digest)) => Self::digest(salt, credential) == digest,
            None => false,
        }
    }
}
