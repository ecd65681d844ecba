/// PKCE (RFC 7636) verifier/challenge pairs for the OAuth code flow
use crate::error::{LinkspaceError, Result};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Number of random bytes behind each verifier (256 bits)
pub const VERIFIER_BYTES: usize = 32;

/// A one-shot verifier and its S256 challenge.
///
/// Generate a fresh pair for every authorization attempt and drop it once
/// the code exchange finishes; it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub verifier: String,
    pub challenge: String,
}

impl PkceChallenge {
    pub const METHOD: &'static str = "S256";

    pub fn generate() -> Result<PkceChallenge> {
        let mut bytes = [0u8; VERIFIER_BYTES];
        getrandom::getrandom(&mut bytes).map_err(|e| LinkspaceError::Entropy(e.to_string()))?;
        Ok(PkceChallenge::from_random_bytes(&bytes))
    }

    pub fn from_random_bytes(bytes: &[u8; VERIFIER_BYTES]) -> PkceChallenge {
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);
        PkceChallenge {
            verifier,
            challenge,
        }
    }
}

/// base64url(SHA-256(verifier)), unpadded
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rfc7636_appendix_b_vector() {
        let bytes: [u8; 32] = [
            116, 24, 223, 180, 151, 153, 224, 37, 79, 250, 96, 125, 216, 173, 187, 186, 22, 212,
            37, 77, 105, 214, 191, 240, 91, 88, 5, 88, 83, 132, 141, 121,
        ];

        let pair = PkceChallenge::from_random_bytes(&bytes);

        assert_eq!(pair.verifier, "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(pair.challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_challenge_matches_recomputed_digest() {
        for _ in 0..16 {
            let pair = PkceChallenge::generate().unwrap();
            assert_eq!(challenge_for(&pair.verifier), pair.challenge);
        }
    }

    #[test]
    fn test_verifier_encodes_32_bytes_without_padding() {
        let pair = PkceChallenge::generate().unwrap();

        assert_eq!(pair.verifier.len(), 43);
        assert!(!pair.verifier.contains('='));
        assert!(!pair.challenge.contains('='));
        assert!(
            pair.verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(URL_SAFE_NO_PAD.decode(&pair.verifier).unwrap().len(), VERIFIER_BYTES);
    }

    #[test]
    fn test_verifiers_are_not_repeated() {
        let verifiers: HashSet<String> = (0..64)
            .map(|_| PkceChallenge::generate().unwrap().verifier)
            .collect();
        assert_eq!(verifiers.len(), 64);
    }
}
