use argon2::{
    Algorithm, Argon2, ParamsBuilder, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::RngCore;

use crate::auth::{AuthError, AuthResult};

const SALT_LEN: usize = 16;
const DEFAULT_M_COST_KIB: u32 = 19 * 1024;
const DEFAULT_T_COST: u32 = 2;

/// Argon2id hashing used for every account password this service writes.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    pub fn new() -> AuthResult<Self> {
        Self::with_cost(DEFAULT_M_COST_KIB, DEFAULT_T_COST)
    }

    /// Build a hasher with explicit memory (KiB) and iteration costs.
    ///
    /// Bulk imports hash one password per row, so tests and tooling may trade
    /// strength for speed here.
    pub fn with_cost(m_cost_kib: u32, t_cost: u32) -> AuthResult<Self> {
        let mut builder = ParamsBuilder::new();
        builder.m_cost(m_cost_kib);
        builder.t_cost(t_cost);
        builder.p_cost(1);
        let params = builder.build().map_err(AuthError::from)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(Self { argon2 })
    }

    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        let mut salt_bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(AuthError::from)?;
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(AuthError::from)?
            .to_string();
        Ok(hash)
    }

    /// Check a plaintext password against a stored PHC string.
    ///
    /// The parameters embedded in the stored hash win over this service's own
    /// costs, so hashes written with other settings still verify.
    pub fn verify_password(&self, password: &str, encoded: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(encoded)?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(AuthError::from(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_and_verifies_passwords() {
        let service = PasswordService::with_cost(1024, 1).expect("password service");
        let hash = service.hash_password("pa55word").expect("hash generation");
        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify_password("pa55word", &hash).expect("verify"));
        assert!(!service.verify_password("Pa55word", &hash).expect("verify"));
    }

    #[test]
    fn hashes_from_other_costs_still_verify() {
        let fast = PasswordService::with_cost(1024, 1).expect("fast service");
        let hash = fast.hash_password("secret").expect("hash generation");
        let default = PasswordService::new().expect("default service");
        assert!(default.verify_password("secret", &hash).expect("verify"));
    }

    #[test]
    fn rejects_malformed_hashes() {
        let service = PasswordService::with_cost(1024, 1).expect("password service");
        assert!(service.verify_password("secret", "not-a-phc-string").is_err());
    }
}
