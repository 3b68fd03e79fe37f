/// Password Hashing and Verification
///
/// Passwords are hashed with HMAC-SHA-512 keyed by a per-account random
/// salt. The salt is stored next to the digest; verification recomputes the
/// MAC and compares in constant time.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;

use crate::error::AppError;

type HmacSha512 = Hmac<Sha512>;

/// Salt length in bytes (the SHA-512 block size)
pub const SALT_LENGTH: usize = 128;

/// Digest length in bytes
pub const HASH_LENGTH: usize = 64;

/// Output of [`hash_password`]
pub struct PasswordDigest {
    pub hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Hash a password under a freshly generated salt
///
/// # Errors
/// Returns error if the MAC cannot be keyed with the salt
pub fn hash_password(password: &str) -> Result<PasswordDigest, AppError> {
    let mut salt = vec![0u8; SALT_LENGTH];
    OsRng.fill_bytes(&mut salt);

    let mut mac = HmacSha512::new_from_slice(&salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    mac.update(password.as_bytes());
    let hash = mac.finalize().into_bytes().to_vec();

    Ok(PasswordDigest { hash, salt })
}

/// Verify a password against a stored digest and salt
///
/// Never fails: a malformed digest or salt simply does not verify.
pub fn verify_password(password: &str, hash: &[u8], salt: &[u8]) -> bool {
    if hash.len() != HASH_LENGTH {
        return false;
    }
    let Ok(mut mac) = HmacSha512::new_from_slice(salt) else {
        return false;
    };
    mac.update(password.as_bytes());
    mac.verify_slice(hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let digest = hash_password("pw1").expect("Failed to hash password");

        assert_eq!(digest.hash.len(), HASH_LENGTH);
        assert_eq!(digest.salt.len(), SALT_LENGTH);
        assert_ne!(digest.hash, b"pw1".to_vec());
    }

    #[test]
    fn test_verify_password() {
        for password in ["pw1", "", "correct horse battery staple", "пароль-密码"] {
            let digest = hash_password(password).expect("Failed to hash password");
            assert!(verify_password(password, &digest.hash, &digest.salt));
        }
    }

    #[test]
    fn test_verify_wrong_password() {
        let digest = hash_password("pw1").expect("Failed to hash password");

        assert!(!verify_password("pw2", &digest.hash, &digest.salt));
        assert!(!verify_password("PW1", &digest.hash, &digest.salt));
        assert!(!verify_password("", &digest.hash, &digest.salt));
    }

    #[test]
    fn test_salts_are_unique() {
        let first = hash_password("same").expect("Failed to hash password");
        let second = hash_password("same").expect("Failed to hash password");

        assert_ne!(first.salt, second.salt);
        assert_ne!(first.hash, second.hash);
    }

    #[test]
    fn test_salt_is_bound_to_hash() {
        let first = hash_password("same").expect("Failed to hash password");
        let second = hash_password("same").expect("Failed to hash password");

        assert!(!verify_password("same", &first.hash, &second.salt));
    }

    #[test]
    fn test_malformed_digest_does_not_verify() {
        let digest = hash_password("pw1").expect("Failed to hash password");

        assert!(!verify_password("pw1", &digest.hash[..32], &digest.salt));
        assert!(!verify_password("pw1", &[], &digest.salt));
        assert!(!verify_password("pw1", &digest.hash, &[]));
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2, HMAC-SHA-512
        let salt = b"Jefe";
        let expected = [
            0x16, 0x4b, 0x7a, 0x7b, 0xfc, 0xf8, 0x19, 0xe2, 0xe3, 0x95, 0xfb, 0xe7, 0x3b, 0x56,
            0xe0, 0xa3, 0x87, 0xbd, 0x64, 0x22, 0x2e, 0x83, 0x1f, 0xd6, 0x10, 0x27, 0x0c, 0xd7,
            0xea, 0x25, 0x05, 0x54, 0x97, 0x58, 0xbf, 0x75, 0xc0, 0x5a, 0x99, 0x4a, 0x6d, 0x03,
            0x4f, 0x65, 0xf8, 0xf0, 0xe6, 0xfd, 0xca, 0xea, 0xb1, 0xa3, 0x4d, 0x4a, 0x6b, 0x4b,
            0x63, 0x6e, 0x07, 0x0a, 0x38, 0xbc, 0xe7, 0x37,
        ];
        assert!(verify_password("what do ya want for nothing?", &expected, salt));
    }
}
