//! Self-issued identity tokens
//!
//! Token format: base64(payload).base64(hmac_sha256(payload))
//! where the payload is the JSON claim `{"id": <user id>}`.
//! Tokens carry no expiry; they stay valid until the secret rotates.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Signed identity claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Internal user id
    pub id: i64,
}

/// Issues and verifies self tokens with a shared secret
#[derive(Clone)]
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    /// Create a codec for the given secret
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Create a signed token embedding `user_id`
    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        let payload = serde_json::to_string(&TokenClaims { id: user_id })
            .map_err(|e| AppError::Internal(e.into()))?;
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        Ok(format!("{}.{}", payload_b64, signature_b64))
    }

    /// Verify a token and return the embedded user id
    ///
    /// # Errors
    /// `DecodeError` for any malformed or mis-signed input
    pub fn verify(&self, token: &str) -> Result<i64, AppError> {
        let (payload_b64, signature_b64) =
            token.split_once('.').ok_or(AppError::DecodeError)?;
        if signature_b64.contains('.') {
            return Err(AppError::DecodeError);
        }

        let signature = general_purpose::URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AppError::DecodeError)?;

        let mut mac = self.mac()?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AppError::DecodeError)?;

        let payload = general_purpose::URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| AppError::DecodeError)?;
        let claims: TokenClaims =
            serde_json::from_slice(&payload).map_err(|_| AppError::DecodeError)?;

        Ok(claims.id)
    }

    fn mac(&self) -> Result<HmacSha256, AppError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid token secret: {e}")))
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    #[test]
    fn issued_token_verifies_to_same_user() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(42).unwrap();

        assert_eq!(codec.verify(&token).unwrap(), 42);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = TokenCodec::new(SECRET);
        let verifier = TokenCodec::new("another-secret-key-32-bytes-long");
        let token = issuer.issue(7).unwrap();

        assert!(matches!(verifier.verify(&token), Err(AppError::DecodeError)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec.issue(1).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_payload = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"id":2}"#);
        let forged = format!("{}.{}", forged_payload, signature);

        assert!(matches!(codec.verify(&forged), Err(AppError::DecodeError)));
    }

    #[test]
    fn malformed_tokens_are_decode_errors() {
        let codec = TokenCodec::new(SECRET);

        for token in ["", "no-dot", "a.b.c", "!!!.???", "abc."] {
            assert!(
                matches!(codec.verify(token), Err(AppError::DecodeError)),
                "{token:?} should not decode"
            );
        }
    }

    #[test]
    fn signed_payload_without_id_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"user":"x"}"#);
        let mut mac = codec.mac().unwrap();
        mac.update(payload_b64.as_bytes());
        let signature_b64 =
            general_purpose::URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        let token = format!("{}.{}", payload_b64, signature_b64);
        assert!(matches!(codec.verify(&token), Err(AppError::DecodeError)));
    }
}
