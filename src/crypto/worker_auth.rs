use hmac::{ Hmac, Mac };
use sha2::Sha256;

use crate::error::{ AppError, Result };

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC of the request.
pub const AUTH_HEADER: &str = "x-worker-auth";

/// Header carrying the signing timestamp in milliseconds since epoch.
pub const TIMESTAMP_HEADER: &str = "x-worker-timestamp";

/// Timestamped HMAC envelope for dispatcher -> executor calls. The MAC covers
/// the decimal timestamp concatenated with the literal transport body bytes,
/// so any re-serialization between signing and sending breaks verification.
pub struct WorkerAuth {
    secret: Vec<u8>,
    max_skew_ms: i64,
}

impl WorkerAuth {
    pub fn new(secret: &[u8], max_skew_seconds: i64) -> Self {
        Self {
            secret: secret.to_vec(),
            max_skew_ms: max_skew_seconds * 1000,
        }
    }

    fn mac(&self, timestamp_ms: i64, body: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e|
            AppError::Internal(format!("HMAC key error: {}", e))
        )?;
        mac.update(timestamp_ms.to_string().as_bytes());
        mac.update(body);
        Ok(mac)
    }

    /// Hex-encoded HMAC-SHA-256 over `timestamp || body`.
    pub fn sign(&self, timestamp_ms: i64, body: &[u8]) -> Result<String> {
        let mac = self.mac(timestamp_ms, body)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify an incoming envelope. Rejects stale timestamps before touching
    /// the signature; the MAC comparison itself is constant-time.
    pub fn verify(
        &self,
        timestamp_ms: i64,
        body: &[u8],
        signature_hex: &str,
        now_ms: i64
    ) -> Result<()> {
        if (now_ms - timestamp_ms).abs() > self.max_skew_ms {
            return Err(
                AppError::Forbidden("request timestamp outside the allowed window".to_string())
            );
        }

        let signature = hex
            ::decode(signature_hex)
            .map_err(|_| AppError::Forbidden("malformed signature".to_string()))?;

        let mac = self.mac(timestamp_ms, body)?;
        mac.verify_slice(&signature).map_err(|_|
            AppError::Forbidden("signature mismatch".to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_sign_verify_round_trip() {
        let auth = WorkerAuth::new(SECRET, 300);
        let body = br#"{"scheduleId":"abc","amount":"5"}"#;

        let signature = auth.sign(1_700_000_000_000, body).unwrap();
        auth.verify(1_700_000_000_000, body, &signature, 1_700_000_001_000).unwrap();
    }

    #[test]
    fn test_skew_window_boundary() {
        let auth = WorkerAuth::new(SECRET, 300);
        let body = b"payload";
        let signature = auth.sign(0, body).unwrap();

        // 299 s after signing: accepted.
        auth.verify(0, body, &signature, 299_000).unwrap();
        // Exactly at the window edge: accepted.
        auth.verify(0, body, &signature, 300_000).unwrap();
        // 301 s after signing: rejected.
        let err = auth.verify(0, body, &signature, 301_000).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_future_timestamps_also_rejected() {
        let auth = WorkerAuth::new(SECRET, 300);
        let body = b"payload";
        let signature = auth.sign(301_000, body).unwrap();

        let err = auth.verify(301_000, body, &signature, 0).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let auth = WorkerAuth::new(SECRET, 300);
        let signature = auth.sign(1000, b"amount=5").unwrap();

        let err = auth.verify(1000, b"amount=6", &signature, 1000).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_timestamp_is_part_of_signed_bytes() {
        let auth = WorkerAuth::new(SECRET, 300);
        let signature = auth.sign(1000, b"payload").unwrap();

        let err = auth.verify(2000, b"payload", &signature, 2000).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = WorkerAuth::new(SECRET, 300);
        let verifier = WorkerAuth::new(b"another-secret-another-secret-32", 300);
        let signature = signer.sign(1000, b"payload").unwrap();

        let err = verifier.verify(1000, b"payload", &signature, 1000).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        let auth = WorkerAuth::new(SECRET, 300);
        let err = auth.verify(1000, b"payload", "not-hex!", 1000).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
