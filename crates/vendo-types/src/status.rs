//! Status and kind enums
//!
//! Rows store the uppercase string forms; these enums are the typed
//! counterparts used above the persistence layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::VendoError;

/// Kind of a ledger entry. The kind fixes the sign of the balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    Payment,
    Earning,
    Refund,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
            Self::Payment => "PAYMENT",
            Self::Earning => "EARNING",
            Self::Refund => "REFUND",
        }
    }

    /// Whether this kind increases the wallet balance.
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Deposit | Self::Earning | Self::Refund)
    }
}

impl FromStr for EntryKind {
    type Err = VendoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAWAL" => Ok(Self::Withdrawal),
            "PAYMENT" => Ok(Self::Payment),
            "EARNING" => Ok(Self::Earning),
            "REFUND" => Ok(Self::Refund),
            other => Err(VendoError::internal(format!(
                "unknown entry kind: {other}"
            ))),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a ledger entry. Entries written by the engine are COMPLETED;
/// the other statuses exist for externally settled flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Reversed => "REVERSED",
        }
    }
}

impl FromStr for EntryStatus {
    type Err = VendoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "REVERSED" => Ok(Self::Reversed),
            other => Err(VendoError::internal(format!(
                "unknown entry status: {other}"
            ))),
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order lifecycle.
///
/// ```text
/// PENDING ──> PAYMENT_PROCESSING ──> COMPLETED ──> CANCELLED | REFUNDED
///    │                │
///    └──> FAILED <────┘
/// ```
///
/// The CANCELLED and REFUNDED transitions out of COMPLETED are reserved;
/// the statuses and transition table exist but no engine operation takes
/// them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    PaymentProcessing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::PaymentProcessing => "PAYMENT_PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Legal transitions of the order state machine.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, PaymentProcessing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (PaymentProcessing, Completed)
                | (PaymentProcessing, Failed)
                | (Completed, Cancelled)
                | (Completed, Refunded)
        )
    }

    /// A terminal order never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Refunded)
    }
}

impl FromStr for OrderStatus {
    type Err = VendoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAYMENT_PROCESSING" => Ok(Self::PaymentProcessing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(VendoError::internal(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an order is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Synchronous internal wallet transfer.
    Wallet,
    /// Deferred settlement through the external card gateway.
    Gateway,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wallet => "WALLET",
            Self::Gateway => "GATEWAY",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = VendoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WALLET" => Ok(Self::Wallet),
            "GATEWAY" => Ok(Self::Gateway),
            other => Err(VendoError::internal(format!(
                "unknown payment method: {other}"
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
