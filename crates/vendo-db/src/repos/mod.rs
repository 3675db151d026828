//! Repository layer
//!
//! One repository per table. Lock-acquiring reads and the writes that
//! depend on them run on a caller-supplied `&mut PgConnection` so they
//! stay inside the caller's transaction.

mod ledger;
mod order;
mod product;
mod wallet;

pub use ledger::LedgerEntryRepo;
pub use order::OrderRepo;
pub use product::ProductRepo;
pub use wallet::WalletRepo;
