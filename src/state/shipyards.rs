// Shipyards, their progress-payment statements and line items, and the
// recalculation engine that keeps statement totals derived from lines.
//
// The repository functions here are a dumb store; draft/closed gating for
// whole-period transitions lives in state::lifecycle. Line mutations do
// check the parent status themselves because every line write must
// synchronously recalculate the parent before returning.

use bson::{DateTime, doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{LedgerError, Result};
use crate::ledger::{ComputedTotals, compute_shipyard_totals};
use crate::models::{
    Actor, ChangeType, EntityKind, LineDelta, LineDirection, Shipyard, ShipyardStatement,
    StatementLine, StatementStatus, StatementTotals, TransferAction,
};

use super::{AppState, now, record_history_best_effort};

pub async fn list_shipyards(state: &AppState) -> Result<Vec<Shipyard>> {
    let mut cursor = state.shipyards.find(doc! {}).sort(doc! { "name": 1 }).await?;
    let mut items = Vec::new();
    while let Some(yard) = cursor.try_next().await? {
        items.push(yard);
    }
    Ok(items)
}

pub async fn get_shipyard_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Shipyard>> {
    state
        .shipyards
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_shipyard(
    state: &AppState,
    name: &str,
    location: &str,
    initial_balance: f64,
    actor: &Actor,
) -> Result<ObjectId> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("shipyard name is required".into()));
    }

    let res = state
        .shipyards
        .insert_one(Shipyard {
            id: None,
            name: name.to_string(),
            location: location.to_string(),
            current_balance: initial_balance,
            created_at: Some(now()),
            updated_at: None,
            created_by: Some(actor.uid.clone()),
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("shipyard insert id"))?;

    record_history_best_effort(
        state,
        EntityKind::Shipyard,
        &id,
        doc! {},
        actor,
        ChangeType::Create,
        None,
    )
    .await;
    Ok(id)
}

pub async fn update_shipyard(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    location: &str,
    actor: &Actor,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("shipyard name is required".into()));
    }

    let existing = get_shipyard_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("shipyard"))?;
    let snapshot = bson::to_document(&existing)?;

    state
        .shipyards
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": name,
                "location": location,
                "updated_at": now(),
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::Shipyard,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

/// Creates a DRAFT statement for a shipyard. `previous_balance` chains
/// from the shipyard's rolling balance, which a CARRIED_OVER close of the
/// prior period left in place.
pub async fn create_statement(
    state: &AppState,
    shipyard_id: &ObjectId,
    title: &str,
    date: DateTime,
    actor: &Actor,
) -> Result<ObjectId> {
    if title.trim().is_empty() {
        return Err(LedgerError::Validation("statement title is required".into()));
    }

    let shipyard = get_shipyard_by_id(state, shipyard_id)
        .await?
        .ok_or(LedgerError::NotFound("shipyard"))?;

    let previous_balance = shipyard.current_balance;
    let res = state
        .shipyard_statements
        .insert_one(ShipyardStatement {
            id: None,
            shipyard_id: shipyard_id.clone(),
            title: title.to_string(),
            date,
            status: StatementStatus::Draft,
            previous_balance,
            totals: StatementTotals::default(),
            final_balance: previous_balance,
            transfer_action: TransferAction::None,
            created_at: Some(now()),
            updated_at: None,
            created_by: Some(actor.uid.clone()),
            updated_by: None,
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("statement insert id"))?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        &id,
        doc! {},
        actor,
        ChangeType::Create,
        None,
    )
    .await;
    Ok(id)
}

pub async fn get_statement_by_id(
    state: &AppState,
    id: &ObjectId,
) -> Result<Option<ShipyardStatement>> {
    state
        .shipyard_statements
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn list_statements_by_shipyard(
    state: &AppState,
    shipyard_id: &ObjectId,
) -> Result<Vec<ShipyardStatement>> {
    let mut cursor = state
        .shipyard_statements
        .find(doc! { "shipyard_id": shipyard_id })
        .sort(doc! { "date": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(statement) = cursor.try_next().await? {
        items.push(statement);
    }
    Ok(items)
}

/// Edits a DRAFT statement's header fields (title/date). Derived fields
/// and previous_balance are untouchable here.
pub async fn update_statement_header(
    state: &AppState,
    id: &ObjectId,
    title: &str,
    date: DateTime,
    actor: &Actor,
) -> Result<()> {
    if title.trim().is_empty() {
        return Err(LedgerError::Validation("statement title is required".into()));
    }

    let existing = get_statement_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&existing)?;
    let snapshot = bson::to_document(&existing)?;

    state
        .shipyard_statements
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "title": title,
                "date": date,
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

/// Sets the opening balance of a shipyard's very first statement.
///
/// Later statements must chain from the prior period's closing balance;
/// editing their previous_balance would break the chain, so the edit is
/// rejected unless no earlier statement exists for the shipyard.
pub async fn set_first_statement_previous_balance(
    state: &AppState,
    statement_id: &ObjectId,
    previous_balance: f64,
    actor: &Actor,
) -> Result<ComputedTotals> {
    let statement = get_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&statement)?;

    let earlier = state
        .shipyard_statements
        .count_documents(doc! {
            "shipyard_id": &statement.shipyard_id,
            "_id": { "$ne": statement_id },
            "date": { "$lte": statement.date },
        })
        .await?;
    if earlier > 0 {
        return Err(LedgerError::InvalidState(
            "previous balance can only be set on the first statement of a shipyard".into(),
        ));
    }

    let snapshot = bson::to_document(&statement)?;
    state
        .shipyard_statements
        .update_one(
            doc! { "_id": statement_id },
            doc! { "$set": {
                "previous_balance": previous_balance,
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    let computed = recalculate_statement(state, statement_id).await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(computed)
}

pub async fn list_statement_lines(
    state: &AppState,
    statement_id: &ObjectId,
) -> Result<Vec<StatementLine>> {
    let mut cursor = state
        .statement_lines
        .find(doc! { "statement_id": statement_id })
        .sort(doc! { "created_at": 1, "_id": 1 })
        .await?;
    let mut items = Vec::new();
    while let Some(line) = cursor.try_next().await? {
        items.push(line);
    }
    Ok(items)
}

pub async fn get_statement_line_by_id(
    state: &AppState,
    id: &ObjectId,
) -> Result<Option<StatementLine>> {
    state
        .statement_lines
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn add_statement_line(
    state: &AppState,
    statement_id: &ObjectId,
    direction: LineDirection,
    category: &str,
    amount: f64,
    is_paid: bool,
    description: &str,
    actor: &Actor,
) -> Result<ObjectId> {
    validate_line(category, amount)?;

    let statement = get_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&statement)?;
    let snapshot = bson::to_document(&statement)?;

    let res = state
        .statement_lines
        .insert_one(StatementLine {
            id: None,
            statement_id: statement_id.clone(),
            direction,
            category: category.to_string(),
            amount,
            is_paid,
            description: description.to_string(),
            created_at: Some(now()),
            updated_at: None,
        })
        .await?;
    let line_id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("line insert id"))?;

    recalculate_statement(state, statement_id).await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::LineAdd,
        Some(LineDelta {
            line_id: line_id.clone(),
            description: description.to_string(),
            amount,
            direction,
        }),
    )
    .await;
    Ok(line_id)
}

pub async fn update_statement_line(
    state: &AppState,
    line_id: &ObjectId,
    direction: LineDirection,
    category: &str,
    amount: f64,
    is_paid: bool,
    description: &str,
    actor: &Actor,
) -> Result<()> {
    validate_line(category, amount)?;

    let line = get_statement_line_by_id(state, line_id)
        .await?
        .ok_or(LedgerError::NotFound("statement line"))?;
    let statement = get_statement_by_id(state, &line.statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&statement)?;
    let snapshot = bson::to_document(&statement)?;

    state
        .statement_lines
        .update_one(
            doc! { "_id": line_id },
            doc! { "$set": {
                "direction": direction.as_str(),
                "category": category,
                "amount": amount,
                "is_paid": is_paid,
                "description": description,
                "updated_at": now(),
            } },
        )
        .await?;

    recalculate_statement(state, &line.statement_id).await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        &line.statement_id,
        snapshot,
        actor,
        ChangeType::LineUpdate,
        Some(LineDelta {
            line_id: line_id.clone(),
            description: description.to_string(),
            amount,
            direction,
        }),
    )
    .await;
    Ok(())
}

pub async fn delete_statement_line(
    state: &AppState,
    line_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let line = get_statement_line_by_id(state, line_id)
        .await?
        .ok_or(LedgerError::NotFound("statement line"))?;
    let statement = get_statement_by_id(state, &line.statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&statement)?;
    let snapshot = bson::to_document(&statement)?;

    state
        .statement_lines
        .delete_one(doc! { "_id": line_id })
        .await?;

    recalculate_statement(state, &line.statement_id).await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        &line.statement_id,
        snapshot,
        actor,
        ChangeType::LineDelete,
        Some(LineDelta {
            line_id: line_id.clone(),
            description: line.description.clone(),
            amount: line.amount,
            direction: line.direction,
        }),
    )
    .await;
    Ok(())
}

/// Recalculation engine: re-derives totals and final balance from the
/// statement's current lines and previous_balance, then persists them.
/// Idempotent; a missing statement surfaces as NotFound so stale writes
/// never silently no-op.
pub async fn recalculate_statement(
    state: &AppState,
    statement_id: &ObjectId,
) -> Result<ComputedTotals> {
    let statement = get_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;

    let lines = list_statement_lines(state, statement_id).await?;
    let computed = compute_shipyard_totals(&lines, statement.previous_balance)?;

    // Recalculating an already-consistent statement must leave no trace,
    // not even an updated_at bump.
    if computed.totals == statement.totals && computed.final_balance == statement.final_balance {
        return Ok(computed);
    }

    state
        .shipyard_statements
        .update_one(
            doc! { "_id": statement_id },
            doc! { "$set": {
                "totals": bson::to_bson(&computed.totals)?,
                "final_balance": computed.final_balance,
                "updated_at": now(),
            } },
        )
        .await?;

    Ok(computed)
}

fn validate_line(category: &str, amount: f64) -> Result<()> {
    if category.trim().is_empty() {
        return Err(LedgerError::Validation("line category is required".into()));
    }
    if amount < 0.0 || !amount.is_finite() {
        return Err(LedgerError::Validation(format!(
            "line amount must be a non-negative number (got {amount})"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_draft(statement: &ShipyardStatement) -> Result<()> {
    if statement.status.is_closed() {
        return Err(LedgerError::InvalidState(
            "statement is closed; reopen it before editing".into(),
        ));
    }
    Ok(())
}
