//! One-way salted password hashes.
//!
//! PBKDF2-HMAC-SHA256, stored as `pbkdf2-sha256$<rounds>$<salt hex>$<digest hex>`. The raw
//! secret never leaves [`PasswordHash::derive`] and [`PasswordHash::verify`].

use crate::constants::{PASSWORD_HASH_ROUNDS, PASSWORD_SALT_LEN};
use crate::error::{HospitalError, HospitalResult};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";

#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes `raw` with a fresh random salt.
    ///
    /// # Errors
    ///
    /// Returns `HospitalError::Validation` if `raw` is empty.
    pub fn derive(raw: &str) -> HospitalResult<Self> {
        if raw.is_empty() {
            return Err(HospitalError::Validation("password cannot be empty".into()));
        }

        let mut salt = [0u8; PASSWORD_SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let digest = stretch(&salt, raw.as_bytes(), PASSWORD_HASH_ROUNDS);
        Ok(Self(format!(
            "{SCHEME}${PASSWORD_HASH_ROUNDS}${}${}",
            hex::encode(salt),
            hex::encode(digest)
        )))
    }

    /// Checks `raw` against the stored hash. Malformed stored values never verify.
    pub fn verify(&self, raw: &str) -> bool {
        let mut parts = self.0.split('$');
        let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };

        let (Ok(rounds), Ok(salt), Ok(expected)) =
            (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected))
        else {
            return false;
        };

        let actual = stretch(&salt, raw.as_bytes(), rounds);
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

fn stretch(salt: &[u8], secret: &[u8], rounds: u32) -> [u8; 32] {
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(secret, salt, rounds, &mut derived);
    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_accepts_original_password() {
        let hash = PasswordHash::derive("s3cret").expect("derive should succeed");
        assert!(hash.verify("s3cret"));
        assert!(!hash.verify("S3cret"));
        assert!(!hash.verify(""));
    }

    #[test]
    fn test_derive_salts_each_hash() {
        let a = PasswordHash::derive("same").unwrap();
        let b = PasswordHash::derive("same").unwrap();
        assert_ne!(a, b, "two hashes of one password should differ by salt");
        assert!(a.verify("same") && b.verify("same"));
    }

    #[test]
    fn test_stored_form_never_contains_raw_secret() {
        let hash = PasswordHash::derive("hunter2").unwrap();
        let stored = serde_json::to_string(&hash).unwrap();
        assert!(!stored.contains("hunter2"));
        assert!(stored.starts_with("\"pbkdf2-sha256$"));
    }

    #[test]
    fn test_stretch_is_standard_pbkdf2_hmac_sha256() {
        let derived = stretch(b"salt", b"password", 1);
        assert_eq!(
            hex::encode(derived),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );

        let stored = format!(
            "\"pbkdf2-sha256$1${}${}\"",
            hex::encode(b"salt"),
            hex::encode(derived)
        );
        let hash: PasswordHash = serde_json::from_str(&stored).unwrap();
        assert!(hash.verify("password"));
        assert!(!hash.verify("passwore"));
    }

    #[test]
    fn test_derive_rejects_empty_password() {
        assert!(matches!(
            PasswordHash::derive(""),
            Err(HospitalError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hash: PasswordHash = serde_json::from_str("\"md5$1$00$00\"").unwrap();
        assert!(!hash.verify("anything"));
        let hash: PasswordHash = serde_json::from_str("\"plain\"").unwrap();
        assert!(!hash.verify("plain"));
    }
}
