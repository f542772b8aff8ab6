// Webhook transport verification.
//
// Events arrive unauthenticated; authenticity comes from an HMAC-SHA256
// signature over `{timestamp}.{raw body}` carried in the signature
// header, Stripe-style: `t=<unix seconds>,v1=<hex digest>`.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::payments::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Signed timestamps older or newer than this are rejected to bound
/// replay of captured deliveries.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// A provider event we act on. Unknown event types parse fine and are
/// ignored downstream.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: WebhookEventObject,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventObject {
    pub id: String,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, PaymentError> {
        serde_json::from_slice(body)
            .map_err(|e| PaymentError::ValidationError(format!("Malformed webhook event: {}", e)))
    }

    /// The payment intent id this event refers to.
    pub fn intent_id(&self) -> &str {
        &self.data.object.id
    }
}

/// Verify the signature header against the raw request body.
///
/// `now` is the receiver's clock in unix seconds; kept as a parameter so
/// verification is deterministic under test.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &[u8],
    now: i64,
) -> Result<(), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => {
                signatures.push(value);
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(PaymentError::SignatureVerificationFailed)?;
    if signatures.is_empty() {
        return Err(PaymentError::SignatureVerificationFailed);
    }

    if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::SignatureVerificationFailed);
    }

    let mut payload = Vec::with_capacity(body.len() + 24);
    payload.extend_from_slice(timestamp.to_string().as_bytes());
    payload.push(b'.');
    payload.extend_from_slice(body);

    // hmac::verify_slice is constant-time.
    for signature in signatures {
        let Ok(expected) = hex::decode(signature) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| PaymentError::SignatureVerificationFailed)?;
        mac.update(&payload);
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(PaymentError::SignatureVerificationFailed)
}

/// Produce a signature header for a payload. Used by tests and the
/// sandbox event emitter.
pub fn sign_payload(secret: &str, body: &[u8], timestamp: i64) -> String {
    let mut payload = Vec::with_capacity(body.len() + 24);
    payload.extend_from_slice(timestamp.to_string().as_bytes());
    payload.push(b'.');
    payload.extend_from_slice(body);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(&payload);
    let digest = hex::encode(mac.finalize().into_bytes());

    format!("t={},v1={}", timestamp, digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn test_round_trip_verifies() {
        let body = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let header = sign_payload(SECRET, body, 1_700_000_000);
        assert!(verify_signature(SECRET, &header, body, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, body, 1_700_000_000);
        assert!(verify_signature(SECRET, &header, br#"{"id":"evt_2"}"#, 1_700_000_000).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, body, 1_700_000_000);
        assert!(verify_signature("whsec_other", &header, body, 1_700_000_000).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, body, 1_700_000_000);
        let late = 1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1;
        assert!(verify_signature(SECRET, &header, body, late).is_err());
        let early = 1_700_000_000 - SIGNATURE_TOLERANCE_SECS - 1;
        assert!(verify_signature(SECRET, &header, body, early).is_err());
    }

    #[test]
    fn test_within_tolerance_accepted() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, body, 1_700_000_000);
        assert!(verify_signature(SECRET, &header, body, 1_700_000_000 + 299).is_ok());
    }

    #[test]
    fn test_malformed_header_rejected() {
        let body = br#"{"id":"evt_1"}"#;
        assert!(verify_signature(SECRET, "", body, 0).is_err());
        assert!(verify_signature(SECRET, "t=abc,v1=zz", body, 0).is_err());
        assert!(verify_signature(SECRET, "v1=deadbeef", body, 0).is_err());
        assert!(verify_signature(SECRET, "t=1700000000", body, 1_700_000_000).is_err());
    }

    #[test]
    fn test_second_v1_entry_accepted() {
        // Key rotation sends one signature per active secret.
        let body = br#"{"id":"evt_1"}"#;
        let signed = sign_payload(SECRET, body, 1_700_000_000);
        let digest = signed.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v1=0000,v1={}", digest);
        assert!(verify_signature(SECRET, &header, body, 1_700_000_000).is_ok());
    }

    #[test]
    fn test_event_parse() {
        let body = br#"{"id":"evt_9","type":"payment_intent.payment_failed","data":{"object":{"id":"pi_42","amount":5000}}}"#;
        let event = WebhookEvent::parse(body).unwrap();
        assert_eq!(event.event_type, "payment_intent.payment_failed");
        assert_eq!(event.intent_id(), "pi_42");
    }
}
