//! Buyer-facing flows composed from the proxy, expansion, and ledger
//! primitives.

pub mod buyers;
pub mod paymethods;
pub mod sale;
pub mod subscriptions;
pub mod transactions;
