// lib.rs
// Bookkeeping core for a shipbuilding-services company, backed by
// MongoDB: shipyard progress-payment (hakediş) statements with balance
// carry, partner monthly draw statements, company expenses, contacts,
// and an append-only audit history.

pub mod error;
pub mod ledger;
pub mod models;
pub mod state;
