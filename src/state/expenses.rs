// Company expenses: standalone CRUD beside the statement ledger, with
// soft delete and the shared audit trail.

use bson::{DateTime, doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{LedgerError, Result};
use crate::models::{
    Actor, ChangeType, EntityKind, Expense, ExpenseStatus, ExpenseType,
};

use super::{AppState, now, record_history_best_effort};

pub async fn create_expense(
    state: &AppState,
    amount: f64,
    description: &str,
    date: DateTime,
    expense_type: ExpenseType,
    status: ExpenseStatus,
    owner: &str,
    currency: &str,
    payment_method: &str,
    receipt_ref: Option<String>,
    actor: &Actor,
) -> Result<ObjectId> {
    validate_expense(amount, description)?;

    let res = state
        .expenses
        .insert_one(Expense {
            id: None,
            amount,
            description: description.to_string(),
            date,
            expense_type,
            status,
            owner: owner.to_string(),
            currency: currency.to_string(),
            payment_method: payment_method.to_string(),
            receipt_ref,
            is_deleted: false,
            created_at: Some(now()),
            updated_at: None,
            created_by: Some(actor.uid.clone()),
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("expense insert id"))?;

    record_history_best_effort(
        state,
        EntityKind::Expense,
        &id,
        doc! {},
        actor,
        ChangeType::Create,
        None,
    )
    .await;
    Ok(id)
}

pub async fn get_expense_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Expense>> {
    state
        .expenses
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

/// Lists live expenses, most recent first. Soft-deleted ones are hidden.
pub async fn list_expenses(state: &AppState) -> Result<Vec<Expense>> {
    let mut cursor = state
        .expenses
        .find(doc! { "is_deleted": false })
        .sort(doc! { "date": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(expense) = cursor.try_next().await? {
        items.push(expense);
    }
    Ok(items)
}

pub async fn list_expenses_with_deleted(state: &AppState) -> Result<Vec<Expense>> {
    let mut cursor = state.expenses.find(doc! {}).sort(doc! { "date": -1 }).await?;
    let mut items = Vec::new();
    while let Some(expense) = cursor.try_next().await? {
        items.push(expense);
    }
    Ok(items)
}

pub async fn update_expense(
    state: &AppState,
    id: &ObjectId,
    amount: f64,
    description: &str,
    date: DateTime,
    expense_type: ExpenseType,
    status: ExpenseStatus,
    owner: &str,
    currency: &str,
    payment_method: &str,
    receipt_ref: Option<String>,
    actor: &Actor,
) -> Result<()> {
    validate_expense(amount, description)?;

    let existing = get_expense_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("expense"))?;
    if existing.is_deleted {
        return Err(LedgerError::InvalidState(
            "expense has been deleted".into(),
        ));
    }
    let snapshot = bson::to_document(&existing)?;

    state
        .expenses
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "amount": amount,
                "description": description,
                "date": date,
                "expense_type": expense_type.as_str(),
                "status": status.as_str(),
                "owner": owner,
                "currency": currency,
                "payment_method": payment_method,
                "receipt_ref": receipt_ref,
                "updated_at": now(),
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::Expense,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

/// Soft delete: flips the flag so the audit trail keeps a live target.
pub async fn delete_expense(state: &AppState, id: &ObjectId, actor: &Actor) -> Result<()> {
    let existing = get_expense_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("expense"))?;
    if existing.is_deleted {
        return Err(LedgerError::InvalidState(
            "expense has already been deleted".into(),
        ));
    }
    let snapshot = bson::to_document(&existing)?;

    state
        .expenses
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "is_deleted": true, "updated_at": now() } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::Expense,
        id,
        snapshot,
        actor,
        ChangeType::Delete,
        None,
    )
    .await;
    Ok(())
}

fn validate_expense(amount: f64, description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "expense description is required".into(),
        ));
    }
    if amount < 0.0 || !amount.is_finite() {
        return Err(LedgerError::Validation(format!(
            "expense amount must be a non-negative number (got {amount})"
        )));
    }
    Ok(())
}
