// state module: AppState, initialization, and re-exports of submodules.

use bson::DateTime;
use mongodb::{Client, Collection, Database};
use std::env;
use std::time::SystemTime;

use crate::error::Result;
use crate::models::{
    Contact, Expense, HistoryEntry, Partner, PartnerStatement, Shipyard, ShipyardStatement,
    StatementLine,
};

mod contacts;
mod expenses;
mod history;
mod lifecycle;
mod partners;
mod shipyards;

pub use contacts::*;
pub use expenses::*;
pub use history::*;
pub use lifecycle::*;
pub use partners::*;
pub use shipyards::*;

/// Explicitly constructed store handle passed into every operation; no
/// ambient/global client anywhere in the crate. The `Client` itself is
/// kept because the close transaction needs `start_session`.
#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub db: Database,
    pub shipyards: Collection<Shipyard>,
    pub shipyard_statements: Collection<ShipyardStatement>,
    pub statement_lines: Collection<StatementLine>,
    pub partners: Collection<Partner>,
    pub partner_statements: Collection<PartnerStatement>,
    pub expenses: Collection<Expense>,
    pub contacts: Collection<Contact>,
    pub history: Collection<HistoryEntry>,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "hakedis".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    Ok(AppState {
        client,
        shipyards: db.collection::<Shipyard>("shipyards"),
        shipyard_statements: db.collection::<ShipyardStatement>("shipyard_statements"),
        statement_lines: db.collection::<StatementLine>("statement_lines"),
        partners: db.collection::<Partner>("partners"),
        partner_statements: db.collection::<PartnerStatement>("partner_statements"),
        expenses: db.collection::<Expense>("expenses"),
        contacts: db.collection::<Contact>("contacts"),
        history: db.collection::<HistoryEntry>("history"),
        db,
    })
}

/// Server-side write timestamp, stamped by this process at write time.
pub(crate) fn now() -> DateTime {
    DateTime::from_system_time(SystemTime::now())
}
