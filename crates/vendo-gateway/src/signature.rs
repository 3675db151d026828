//! Webhook signature verification
//!
//! The gateway signs each delivery with HMAC-SHA256 over
//! `"{timestamp}.{payload}"` and sends a `t=<unix>,v1=<hex>` header.
//! Verification is constant-time and rejects stale timestamps to bound
//! replay windows.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use vendo_types::{Result, VendoError};

type HmacSha256 = Hmac<Sha256>;

/// Default allowed clock skew between the gateway and us, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Verifies gateway webhook signatures with a shared secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Compute the signature header for a payload. Used by the mock
    /// gateway and by tests to produce valid deliveries.
    pub fn sign(&self, timestamp: i64, payload: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a signature header against a payload, with `now` supplied by
    /// the caller so the skew check is testable.
    pub fn verify(&self, payload: &[u8], header: &str, now: i64) -> Result<()> {
        let (timestamp, hex_sig) = parse_header(header)?;

        if (now - timestamp).abs() > self.tolerance_secs {
            return Err(VendoError::GatewayRejected {
                reason: format!("signature timestamp {timestamp} outside tolerance"),
            });
        }

        let sig = hex::decode(hex_sig).map_err(|_| VendoError::GatewayRejected {
            reason: "signature is not valid hex".to_string(),
        })?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&sig).map_err(|_| VendoError::GatewayRejected {
            reason: "signature mismatch".to_string(),
        })
    }
}

fn parse_header(header: &str) -> Result<(i64, &str)> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("v1", v)) => signature = Some(v),
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(s)) => Ok((t, s)),
        _ => Err(VendoError::GatewayRejected {
            reason: "malformed signature header".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(b"whsec_test".to_vec())
    }

    #[test]
    fn test_sign_and_verify() {
        let v = verifier();
        let payload = br#"{"type":"checkout_completed"}"#;
        let header = v.sign(NOW, payload);
        assert!(v.verify(payload, &header, NOW).is_ok());
    }

    #[test]
    fn test_rejects_wrong_key() {
        let header = verifier().sign(NOW, b"payload");
        let other = SignatureVerifier::new(b"whsec_other".to_vec());
        let err = other.verify(b"payload", &header, NOW).unwrap_err();
        assert_eq!(err.error_code(), "GATEWAY_REJECTED");
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let v = verifier();
        let header = v.sign(NOW, b"original");
        assert!(v.verify(b"tampered", &header, NOW).is_err());
    }

    #[test]
    fn test_rejects_stale_timestamp() {
        let v = verifier();
        let header = v.sign(NOW - DEFAULT_TOLERANCE_SECS - 1, b"payload");
        let err = v.verify(b"payload", &header, NOW).unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn test_rejects_malformed_header() {
        let v = verifier();
        assert!(v.verify(b"payload", "nonsense", NOW).is_err());
        assert!(v.verify(b"payload", "t=abc,v1=", NOW).is_err());
        assert!(v.verify(b"payload", "t=123", NOW).is_err());
    }

    #[test]
    fn test_rejects_non_hex_signature() {
        let v = verifier();
        let header = format!("t={NOW},v1=zzzz");
        assert!(v.verify(b"payload", &header, NOW).is_err());
    }
}
