//! Vendo Types - Canonical domain types for the wallet ledger and
//! purchase-settlement engine
//!
//! This crate contains the foundational types shared by every vendo crate,
//! with zero dependencies on the rest of the workspace:
//!
//! - Status and kind enums for ledger entries and orders
//! - Money helpers (minor-unit conversion, sign conventions)
//! - The error taxonomy for the whole engine
//!
//! # Invariants carried by these types
//!
//! 1. Amounts are `rust_decimal::Decimal`, never floating point
//! 2. Ledger entries are append-only; their kinds fix the balance sign
//! 3. Order status transitions form a closed state machine

pub mod error;
pub mod money;
pub mod status;

pub use error::{Result, VendoError};
pub use money::{from_minor_units, to_minor_units};
pub use status::{EntryKind, EntryStatus, OrderStatus, PaymentMethod};
