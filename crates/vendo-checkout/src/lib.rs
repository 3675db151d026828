//! Vendo Purchase Orchestrator
//!
//! Drives the two settlement paths as explicit multi-step transactions:
//!
//! - **Wallet path**: one transaction reserves the product under lock,
//!   moves money between the buyer and seller wallets, decrements stock and
//!   inserts a COMPLETED order. All or nothing.
//! - **Gateway path**: creates an external checkout session and a PENDING
//!   order; the [`reconcile::ReconciliationHandler`] finishes it when the
//!   gateway's confirmation event arrives, re-checking stock at that point.
//!
//! Both paths converge on the same inventory-guard and ledger primitives,
//! so stock and balance invariants hold identically regardless of path.

pub mod config;
pub mod inventory;
pub mod orchestrator;
pub mod reconcile;

pub use config::CheckoutConfig;
pub use orchestrator::CheckoutService;
pub use reconcile::ReconciliationHandler;
