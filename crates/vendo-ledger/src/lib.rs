//! Vendo Wallet Ledger Engine
//!
//! Applies deposits, withdrawals and paired debit/credit transfers against
//! the wallet store. Every balance change:
//!
//! 1. reads the wallet row under an exclusive lock (`FOR UPDATE`),
//! 2. computes the new balance from that locked read,
//! 3. writes the balance and appends an immutable ledger entry with
//!    before/after snapshots — all in one transaction.
//!
//! `deposit` and `withdraw` own their transaction. `debit` and `credit`
//! are transfer halves that run on the purchase orchestrator's enclosing
//! transaction and must never be called outside one.

mod config;
mod engine;

pub use config::LedgerConfig;
pub use engine::{ordered_pair, LedgerEngine};
