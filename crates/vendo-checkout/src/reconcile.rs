//! Gateway reconciliation handler
//!
//! Consumes asynchronous payment-confirmation events and completes orders
//! left PENDING by the gateway path, reusing the orchestrator's
//! completion primitive. Delivery is at-least-once; "already COMPLETED"
//! is success here, not an error.

use std::sync::Arc;

use tracing::{debug, info};

use vendo_db::DbOrder;
use vendo_gateway::{GatewayClient, GatewayEventType};
use vendo_types::Result;

use crate::orchestrator::CheckoutService;

/// Applies verified gateway events to pending orders.
pub struct ReconciliationHandler<G: GatewayClient> {
    checkout: Arc<CheckoutService<G>>,
    gateway: Arc<G>,
}

impl<G: GatewayClient> ReconciliationHandler<G> {
    pub fn new(checkout: Arc<CheckoutService<G>>, gateway: Arc<G>) -> Self {
        Self { checkout, gateway }
    }

    /// Handle one raw webhook delivery.
    ///
    /// The signature is verified before anything else; a bad signature is
    /// a rejected event (`GatewayRejected`), never a silent drop. Event
    /// types other than checkout completion are acknowledged and skipped,
    /// returning `None`.
    pub async fn handle_event(&self, payload: &[u8], signature: &str) -> Result<Option<DbOrder>> {
        let confirmation = self
            .gateway
            .verify_and_parse_confirmation(payload, signature)
            .await?;

        match confirmation.event_type {
            GatewayEventType::CheckoutCompleted => {
                let order = self
                    .checkout
                    .complete_gateway_order(
                        &confirmation.session_id,
                        &confirmation.external_payment_id,
                    )
                    .await?;
                info!(
                    order_id = %order.id,
                    session_id = %confirmation.session_id,
                    status = %order.status,
                    "confirmation event applied"
                );
                Ok(Some(order))
            }
            GatewayEventType::Other(event_type) => {
                debug!(%event_type, "ignoring gateway event");
                Ok(None)
            }
        }
    }
}
