//! PKCE (Proof Key for Code Exchange) for the code flow.
//!
//! The verifier is generated at sign-in, kept in session storage, and sent
//! back with the authorization code when the callback exchanges it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Challenge method name as the auth service expects it.
pub const PKCE_METHOD: &str = "s256";

/// RFC 7636 unreserved characters.
const VERIFIER_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

const PKCE_VERIFIER_LENGTH: usize = 112;

#[derive(Debug, Clone)]
pub struct Pkce {
    /// Secret, sent only with the code exchange.
    pub verifier: String,
    /// SHA-256 of the verifier, base64url without padding.
    pub challenge: String,
}

impl Pkce {
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let verifier: String = (0..PKCE_VERIFIER_LENGTH)
            .map(|_| VERIFIER_CHARS[rng.random_range(0..VERIFIER_CHARS.len())] as char)
            .collect();
        let challenge = challenge_for(&verifier);
        Self { verifier, challenge }
    }
}

/// S256 challenge of a verifier.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let pkce = Pkce::generate();
        assert_eq!(pkce.verifier.len(), PKCE_VERIFIER_LENGTH);
        assert!(pkce.verifier.bytes().all(|b| VERIFIER_CHARS.contains(&b)));
        assert_eq!(pkce.challenge, challenge_for(&pkce.verifier));
        assert!(!pkce.challenge.contains('='));
    }

    #[test]
    fn test_known_vector() {
        // RFC 7636 appendix B.
        assert_eq!(
            challenge_for("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_unique() {
        assert_ne!(Pkce::generate().verifier, Pkce::generate().verifier);
    }
}
