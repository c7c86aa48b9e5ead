// Period lifecycle controller: the DRAFT -> CLOSED -> (reopen) state
// machine for both statement types, balance propagation on close, and the
// draft-only delete rule. Closing a shipyard statement is the one
// multi-document transaction in the system: statement status and the
// parent shipyard's rolling balance move together or not at all.

use bson::{doc, oid::ObjectId};
use mongodb::ClientSession;
use tracing::info;

use crate::error::{LedgerError, Result};
use crate::models::{
    Actor, ChangeType, EntityKind, StatementStatus, TransferAction,
};

use super::shipyards::{ensure_draft, get_statement_by_id, recalculate_statement};
use super::partners::{ensure_partner_statement_draft, get_partner_statement_by_id};
use super::{AppState, get_shipyard_by_id, now, record_history_best_effort};

/// Closes a DRAFT shipyard statement.
///
/// `CarriedOver` leaves the final balance as the shipyard's new running
/// balance (so the next period chains from it); `TransferredToSafe`
/// sweeps it to the company safe and zeroes the shipyard balance. Totals
/// are recalculated first so the frozen figures match the lines on disk.
pub async fn close_shipyard_statement(
    state: &AppState,
    statement_id: &ObjectId,
    action: TransferAction,
    actor: &Actor,
) -> Result<()> {
    if action == TransferAction::None {
        return Err(LedgerError::Validation(
            "closing a statement requires a transfer action".into(),
        ));
    }

    let statement = get_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&statement)?;

    let computed = recalculate_statement(state, statement_id).await?;

    let shipyard = get_shipyard_by_id(state, &statement.shipyard_id)
        .await?
        .ok_or(LedgerError::NotFound("shipyard"))?;
    let shipyard_id = shipyard.id.ok_or(LedgerError::NotFound("shipyard id"))?;

    let new_shipyard_balance = match action {
        TransferAction::CarriedOver => computed.final_balance,
        TransferAction::TransferredToSafe => 0.0,
        TransferAction::None => unreachable!("rejected above"),
    };

    // Snapshot after recalculation so the audit record carries the
    // figures that were actually frozen.
    let snapshot = match get_statement_by_id(state, statement_id).await? {
        Some(fresh) => bson::to_document(&fresh)?,
        None => return Err(LedgerError::NotFound("statement")),
    };

    let mut session = state.client.start_session().await?;
    session.start_transaction().await?;
    match apply_close_writes(
        state,
        &mut session,
        statement_id,
        &shipyard_id,
        action,
        new_shipyard_balance,
        actor,
    )
    .await
    {
        Ok(()) => session.commit_transaction().await?,
        Err(err) => {
            let _ = session.abort_transaction().await;
            return Err(err);
        }
    }

    info!(
        statement_id = %statement_id,
        action = action.as_str(),
        final_balance = computed.final_balance,
        "statement closed"
    );

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Close,
        None,
    )
    .await;
    Ok(())
}

async fn apply_close_writes(
    state: &AppState,
    session: &mut ClientSession,
    statement_id: &ObjectId,
    shipyard_id: &ObjectId,
    action: TransferAction,
    new_shipyard_balance: f64,
    actor: &Actor,
) -> Result<()> {
    state
        .shipyard_statements
        .update_one(
            doc! { "_id": statement_id },
            doc! { "$set": {
                "status": StatementStatus::Closed.as_str(),
                "transfer_action": action.as_str(),
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .session(&mut *session)
        .await?;
    state
        .shipyards
        .update_one(
            doc! { "_id": shipyard_id },
            doc! { "$set": {
                "current_balance": new_shipyard_balance,
                "updated_at": now(),
            } },
        )
        .session(&mut *session)
        .await?;
    Ok(())
}

/// Reopens a CLOSED shipyard statement for corrections.
///
/// The balance propagation that already happened on close is left alone;
/// the operator is expected to re-close afterwards to re-propagate.
pub async fn reopen_shipyard_statement(
    state: &AppState,
    statement_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let statement = get_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    if !statement.status.is_closed() {
        return Err(LedgerError::InvalidState(
            "only a closed statement can be reopened".into(),
        ));
    }
    let snapshot = bson::to_document(&statement)?;

    state
        .shipyard_statements
        .update_one(
            doc! { "_id": statement_id },
            doc! { "$set": {
                "status": StatementStatus::Draft.as_str(),
                "transfer_action": TransferAction::None.as_str(),
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Reopen,
        None,
    )
    .await;
    Ok(())
}

/// Deletes a DRAFT shipyard statement. Child line items are not cascaded;
/// the caller owns that cleanup (lossy operation, operator-only).
pub async fn delete_shipyard_statement(
    state: &AppState,
    statement_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let statement = get_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("statement"))?;
    ensure_draft(&statement)?;
    let snapshot = bson::to_document(&statement)?;

    state
        .shipyard_statements
        .delete_one(doc! { "_id": statement_id })
        .await?;

    record_history_best_effort(
        state,
        EntityKind::ShipyardStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Delete,
        None,
    )
    .await;
    Ok(())
}

/// Closes a DRAFT partner statement. No transfer branching here: the next
/// month's opening balance is derived from this period's
/// `next_month_balance` at creation time, advisorily.
pub async fn close_partner_statement(
    state: &AppState,
    statement_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let statement = get_partner_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("partner statement"))?;
    ensure_partner_statement_draft(&statement)?;
    let snapshot = bson::to_document(&statement)?;

    state
        .partner_statements
        .update_one(
            doc! { "_id": statement_id },
            doc! { "$set": {
                "status": StatementStatus::Closed.as_str(),
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::PartnerStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Close,
        None,
    )
    .await;
    Ok(())
}

pub async fn reopen_partner_statement(
    state: &AppState,
    statement_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let statement = get_partner_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("partner statement"))?;
    if !statement.status.is_closed() {
        return Err(LedgerError::InvalidState(
            "only a closed partner statement can be reopened".into(),
        ));
    }
    let snapshot = bson::to_document(&statement)?;

    state
        .partner_statements
        .update_one(
            doc! { "_id": statement_id },
            doc! { "$set": {
                "status": StatementStatus::Draft.as_str(),
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::PartnerStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Reopen,
        None,
    )
    .await;
    Ok(())
}

pub async fn delete_partner_statement(
    state: &AppState,
    statement_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let statement = get_partner_statement_by_id(state, statement_id)
        .await?
        .ok_or(LedgerError::NotFound("partner statement"))?;
    ensure_partner_statement_draft(&statement)?;
    let snapshot = bson::to_document(&statement)?;

    state
        .partner_statements
        .delete_one(doc! { "_id": statement_id })
        .await?;

    record_history_best_effort(
        state,
        EntityKind::PartnerStatement,
        statement_id,
        snapshot,
        actor,
        ChangeType::Delete,
        None,
    )
    .await;
    Ok(())
}
