//! Vendo Gateway Client
//!
//! The collaborator interface to the external card-payment gateway. The
//! core consumes two operations: creating a hosted checkout session for the
//! deferred settlement path, and verifying + parsing the asynchronous
//! confirmation events the gateway delivers at-least-once.
//!
//! The production client lives outside this workspace; [`MockGateway`]
//! implements the same trait for tests and local development.

pub mod mock;
pub mod signature;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vendo_types::Result;

pub use mock::MockGateway;
pub use signature::SignatureVerifier;

/// Request to open a hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub product_id: Uuid,
    pub product_name: String,
    /// Price in integer minor units (e.g. cents).
    pub amount_minor: i64,
    pub currency: String,
    pub buyer_id: Uuid,
    pub buyer_email: String,
}

/// An open checkout session at the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

/// Event types the reconciliation handler understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEventType {
    /// The buyer completed payment for a checkout session.
    CheckoutCompleted,
    /// Anything else the gateway sends; acknowledged and ignored.
    #[serde(untagged)]
    Other(String),
}

/// A verified, parsed confirmation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub session_id: String,
    pub external_payment_id: String,
    pub event_type: GatewayEventType,
}

/// Gateway client collaborator interface.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Create a hosted checkout session for a product at a fixed price.
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession>;

    /// Verify the signature of a raw confirmation payload and parse it.
    /// A verification failure is an error (`GatewayRejected`), never a
    /// silent drop.
    async fn verify_and_parse_confirmation(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<PaymentConfirmation>;
}
