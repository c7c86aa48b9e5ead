// Audit/history recorder: append-only snapshots of pre-mutation state,
// newest-first listing, and revert-by-replay. History writes are
// best-effort by policy: a failed append is logged and reported, but it
// never rolls back the primary business operation.

use bson::{Document, doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use tracing::warn;

use crate::error::{LedgerError, Result};
use crate::models::{Actor, ChangeType, EntityKind, HistoryEntry, LineDelta};

use super::{AppState, now};

/// Appends one immutable history entry. `previous_data` must be the full
/// document as it looked *before* the mutation, so that revert means
/// "re-apply this snapshot".
pub async fn record_history(
    state: &AppState,
    entity_kind: EntityKind,
    entity_id: &ObjectId,
    previous_data: Document,
    actor: &Actor,
    change_type: ChangeType,
    line: Option<LineDelta>,
) -> Result<ObjectId> {
    let res = state
        .history
        .insert_one(HistoryEntry {
            id: None,
            entity_kind,
            entity_id: entity_id.clone(),
            change_type,
            previous_data,
            changed_at: now(),
            actor: actor.clone(),
            line,
        })
        .await?;
    res.inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("history insert id"))
}

/// Best-effort wrapper around [`record_history`]: logs the failure and
/// returns whether the append landed. Primary mutations call this so an
/// audit outage never blocks bookkeeping.
pub async fn record_history_best_effort(
    state: &AppState,
    entity_kind: EntityKind,
    entity_id: &ObjectId,
    previous_data: Document,
    actor: &Actor,
    change_type: ChangeType,
    line: Option<LineDelta>,
) -> bool {
    match record_history(
        state,
        entity_kind,
        entity_id,
        previous_data,
        actor,
        change_type,
        line,
    )
    .await
    {
        Ok(_) => true,
        Err(err) => {
            warn!(
                entity_kind = entity_kind.as_str(),
                entity_id = %entity_id,
                change_type = change_type.as_str(),
                error = %err,
                "history append failed; primary operation unaffected"
            );
            false
        }
    }
}

/// Lists an entity's history, newest first.
pub async fn list_history(
    state: &AppState,
    entity_kind: EntityKind,
    entity_id: &ObjectId,
    limit: i64,
) -> Result<Vec<HistoryEntry>> {
    let mut cursor = state
        .history
        .find(doc! {
            "entity_kind": entity_kind.as_str(),
            "entity_id": entity_id,
        })
        .sort(doc! { "changed_at": -1, "_id": -1 })
        .limit(limit)
        .await?;
    let mut items = Vec::new();
    while let Some(entry) = cursor.try_next().await? {
        items.push(entry);
    }
    Ok(items)
}

/// Re-applies a captured snapshot as the entity's current state.
///
/// The revert itself is audited: a new REVERT entry captures the state
/// that existed immediately before the revert, so a revert can be
/// reverted in turn. Existing entries are never overwritten or deleted.
pub async fn revert_to_history_entry(
    state: &AppState,
    entity_kind: EntityKind,
    entity_id: &ObjectId,
    history_entry_id: &ObjectId,
    actor: &Actor,
) -> Result<()> {
    let entry = state
        .history
        .find_one(doc! {
            "_id": history_entry_id,
            "entity_kind": entity_kind.as_str(),
            "entity_id": entity_id,
        })
        .await?
        .ok_or(LedgerError::NotFound("history entry"))?;

    let collection = state
        .db
        .collection::<Document>(entity_kind.collection_name());
    let current = collection
        .find_one(doc! { "_id": entity_id })
        .await?
        .ok_or(LedgerError::NotFound("entity to revert"))?;

    let mut restored = entry.previous_data.clone();
    restored.insert("_id", entity_id.clone());
    collection
        .replace_one(doc! { "_id": entity_id }, restored)
        .await?;

    record_history_best_effort(
        state,
        entity_kind,
        entity_id,
        current,
        actor,
        ChangeType::Revert,
        None,
    )
    .await;

    Ok(())
}
