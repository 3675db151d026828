//! Mock gateway for tests and local development
//!
//! Speaks the same wire shapes as the production client: JSON event
//! payloads signed with the shared-secret scheme from [`crate::signature`].

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vendo_types::{Result, VendoError};

use crate::{
    CheckoutSession, CheckoutSessionRequest, GatewayClient, GatewayEventType,
    PaymentConfirmation, SignatureVerifier,
};

/// Wire form of a confirmation event payload.
#[derive(Debug, Serialize, Deserialize)]
struct EventPayload {
    #[serde(rename = "type")]
    event_type: GatewayEventType,
    data: EventData,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventData {
    session_id: String,
    payment_id: String,
}

/// In-memory gateway. Sessions are recorded so tests can assert on what
/// was sent; confirmations are verified exactly like production ones.
pub struct MockGateway {
    verifier: SignatureVerifier,
    sessions: Mutex<Vec<CheckoutSessionRequest>>,
    fail_next: Mutex<bool>,
}

impl MockGateway {
    pub fn new(webhook_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            verifier: SignatureVerifier::new(webhook_secret),
            sessions: Mutex::new(Vec::new()),
            fail_next: Mutex::new(false),
        }
    }

    /// Make the next `create_checkout_session` call fail, to exercise the
    /// gateway-unavailable path.
    pub fn fail_next_session(&self) {
        *self.fail_next.lock() = true;
    }

    /// Requests seen so far.
    pub fn recorded_sessions(&self) -> Vec<CheckoutSessionRequest> {
        self.sessions.lock().clone()
    }

    /// Build a signed confirmation delivery for a session, as the gateway
    /// would send it. Returns `(payload, signature_header)`.
    pub fn signed_confirmation(
        &self,
        session_id: &str,
        payment_id: &str,
        timestamp: i64,
    ) -> (Vec<u8>, String) {
        let payload = serde_json::to_vec(&EventPayload {
            event_type: GatewayEventType::CheckoutCompleted,
            data: EventData {
                session_id: session_id.to_string(),
                payment_id: payment_id.to_string(),
            },
        })
        .expect("event payload serializes");
        let header = self.verifier.sign(timestamp, &payload);
        (payload, header)
    }

    /// Build a signed event of an arbitrary type.
    pub fn signed_event(
        &self,
        event_type: &str,
        session_id: &str,
        payment_id: &str,
        timestamp: i64,
    ) -> (Vec<u8>, String) {
        let payload = serde_json::to_vec(&serde_json::json!({
            "type": event_type,
            "data": { "session_id": session_id, "payment_id": payment_id },
        }))
        .expect("event payload serializes");
        let header = self.verifier.sign(timestamp, &payload);
        (payload, header)
    }
}

#[async_trait]
impl GatewayClient for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession> {
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err(VendoError::GatewayUnavailable {
                reason: "mock gateway configured to fail".to_string(),
            });
        }

        let session_id = format!("cs_{}", uuid::Uuid::new_v4().simple());
        let session = CheckoutSession {
            checkout_url: format!("https://gateway.example/pay/{session_id}"),
            session_id,
        };
        debug!(session_id = %session.session_id, product_id = %request.product_id, "mock checkout session created");
        self.sessions.lock().push(request);
        Ok(session)
    }

    async fn verify_and_parse_confirmation(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentConfirmation> {
        let now = chrono::Utc::now().timestamp();
        self.verifier.verify(payload, signature, now)?;

        let event: EventPayload =
            serde_json::from_slice(payload).map_err(|e| VendoError::GatewayRejected {
                reason: format!("malformed event payload: {e}"),
            })?;

        Ok(PaymentConfirmation {
            session_id: event.data.session_id,
            external_payment_id: event.data.payment_id,
            event_type: event.event_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            product_id: Uuid::new_v4(),
            product_name: "Test Product".to_string(),
            amount_minor: 19999,
            currency: "USD".to_string(),
            buyer_id: Uuid::new_v4(),
            buyer_email: "buyer@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_creates_distinct_sessions() {
        let gateway = MockGateway::new(b"whsec_test".to_vec());
        let a = gateway.create_checkout_session(request()).await.unwrap();
        let b = gateway.create_checkout_session(request()).await.unwrap();
        assert_ne!(a.session_id, b.session_id);
        assert!(a.checkout_url.contains(&a.session_id));
        assert_eq!(gateway.recorded_sessions().len(), 2);
    }

    #[tokio::test]
    async fn test_confirmation_round_trip() {
        let gateway = MockGateway::new(b"whsec_test".to_vec());
        let now = chrono::Utc::now().timestamp();
        let (payload, header) = gateway.signed_confirmation("cs_123", "pay_456", now);

        let conf = gateway
            .verify_and_parse_confirmation(&payload, &header)
            .await
            .unwrap();
        assert_eq!(conf.session_id, "cs_123");
        assert_eq!(conf.external_payment_id, "pay_456");
        assert_eq!(conf.event_type, GatewayEventType::CheckoutCompleted);
    }

    #[tokio::test]
    async fn test_rejects_bad_signature() {
        let gateway = MockGateway::new(b"whsec_test".to_vec());
        let now = chrono::Utc::now().timestamp();
        let (payload, _) = gateway.signed_confirmation("cs_123", "pay_456", now);

        let err = gateway
            .verify_and_parse_confirmation(&payload, "t=0,v1=deadbeef")
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "GATEWAY_REJECTED");
    }

    #[tokio::test]
    async fn test_unknown_event_type_parses_as_other() {
        let gateway = MockGateway::new(b"whsec_test".to_vec());
        let now = chrono::Utc::now().timestamp();
        let (payload, header) = gateway.signed_event("invoice.paid", "cs_1", "pay_1", now);

        let conf = gateway
            .verify_and_parse_confirmation(&payload, &header)
            .await
            .unwrap();
        assert_eq!(
            conf.event_type,
            GatewayEventType::Other("invoice.paid".to_string())
        );
    }

    #[tokio::test]
    async fn test_fail_next_session() {
        let gateway = MockGateway::new(b"whsec_test".to_vec());
        gateway.fail_next_session();
        let err = gateway.create_checkout_session(request()).await.unwrap_err();
        assert!(err.is_retriable());
        assert!(gateway.create_checkout_session(request()).await.is_ok());
    }
}
