//! Signs and verifies session tokens so a client-held token cannot be
//! forged or replayed past its TTL.

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Signs a session id together with the time it was signed, and verifies
/// that signature (and the token's age) on the way back in.
///
/// The wire format is `<id>.<timestamp>.<signature>`, each segment
/// URL-safe base64 without padding: the id and timestamp travel in the
/// clear (a session id is not a secret, only forging or backdating one
/// should be impossible) while the signature covers both.
pub struct SessionSigner {
    secret: Vec<u8>,
}

impl SessionSigner {
    /// Creates a signer keyed by `secret`.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    /// Signs `session_id`, stamping it with the current time.
    #[must_use]
    pub fn sign(&self, session_id: &str) -> String {
        let timestamp = now_unix();
        self.sign_at(session_id, timestamp)
    }

    fn sign_at(&self, session_id: &str, timestamp: u64) -> String {
        let id_segment = URL_SAFE_NO_PAD.encode(session_id.as_bytes());
        let ts_segment = URL_SAFE_NO_PAD.encode(timestamp.to_be_bytes());
        let signature = self.mac_for(&id_segment, &ts_segment);
        format!("{id_segment}.{ts_segment}.{signature}")
    }

    fn mac_for(&self, id_segment: &str, ts_segment: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(id_segment.as_bytes());
        mac.update(b".");
        mac.update(ts_segment.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Verifies `token`'s signature and extracts the session id, rejecting
    /// a token older than `max_age` seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MalformedToken`] if the token is not
    /// three dot-separated base64 segments, or
    /// [`SessionError::InvalidSignature`]/[`SessionError::TokenExpired`]
    /// if the signature does not match or the token is too old.
    pub fn unsign(&self, token: &str, max_age_secs: u64) -> Result<String, SessionError> {
        let mut parts = token.split('.');
        let (Some(id_segment), Some(ts_segment), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::MalformedToken);
        };

        let expected = self.mac_for(id_segment, ts_segment);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(SessionError::InvalidSignature);
        }

        let ts_bytes = URL_SAFE_NO_PAD
            .decode(ts_segment)
            .map_err(|_| SessionError::MalformedToken)?;
        let ts_bytes: [u8; 8] = ts_bytes.try_into().map_err(|_| SessionError::MalformedToken)?;
        let signed_at = u64::from_be_bytes(ts_bytes);

        if now_unix().saturating_sub(signed_at) > max_age_secs {
            return Err(SessionError::TokenExpired);
        }

        let id_bytes = URL_SAFE_NO_PAD
            .decode(id_segment)
            .map_err(|_| SessionError::MalformedToken)?;
        String::from_utf8(id_bytes).map_err(|_| SessionError::MalformedToken)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

static SIGNER: OnceLock<SessionSigner> = OnceLock::new();

/// The process-wide signer, keyed by `config.security.secret_key`.
/// Initialized once from the first caller's secret; later calls ignore
/// their argument if a signer already exists, matching the global-singleton
/// pattern the session layer this replaces used.
pub fn global_signer(secret: impl Into<Vec<u8>>) -> &'static SessionSigner {
    SIGNER.get_or_init(|| SessionSigner::new(secret))
}

#[cfg(test)]
mod tests {
    use super::SessionSigner;

    #[test]
    fn round_trips_a_freshly_signed_token() {
        let signer = SessionSigner::new("test-secret");
        let token = signer.sign("session-123");
        assert_eq!(signer.unsign(&token, 300).expect("valid"), "session-123");
    }

    #[test]
    fn rejects_a_tampered_signature() {
        let signer = SessionSigner::new("test-secret");
        let mut token = signer.sign("session-123");
        token.push('x');
        assert!(signer.unsign(&token, 300).is_err());
    }

    #[test]
    fn rejects_a_token_signed_by_a_different_secret() {
        let signer_a = SessionSigner::new("secret-a");
        let signer_b = SessionSigner::new("secret-b");
        let token = signer_a.sign("session-123");
        assert!(signer_b.unsign(&token, 300).is_err());
    }

    #[test]
    fn rejects_an_expired_token() {
        let signer = SessionSigner::new("test-secret");
        let token = signer.sign_at("session-123", 0);
        assert!(matches!(
            signer.unsign(&token, 300),
            Err(crate::error::SessionError::TokenExpired)
        ));
    }

    #[test]
    fn rejects_a_malformed_token() {
        let signer = SessionSigner::new("test-secret");
        assert!(signer.unsign("not-a-valid-token", 300).is_err());
    }
}
