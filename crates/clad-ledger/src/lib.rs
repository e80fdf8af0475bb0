pub mod memory;
pub mod store;

pub use memory::MemoryLedger;
pub use store::{AdWatchAttempt, AdWatchOutcome, LedgerStore};
