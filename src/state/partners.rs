// Partners (owners) and their monthly draw statements. One statement per
// partner per calendar month, enforced only by an advisory pre-create
// existence check so an operator can still create corrective duplicates.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{LedgerError, Result};
use crate::ledger::compute_partner_next_balance;
use crate::models::{
    Actor, ChangeType, EntityKind, Partner, PartnerStatement, StatementStatus,
};

use super::{AppState, now, record_history_best_effort};

pub async fn list_partners(state: &AppState) -> Result<Vec<Partner>> {
    let mut cursor = state.partners.find(doc! {}).sort(doc! { "name": 1 }).await?;
    let mut items = Vec::new();
    while let Some(partner) = cursor.try_next().await? {
        items.push(partner);
    }
    Ok(items)
}

pub async fn get_partner_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Partner>> {
    state
        .partners
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_partner(
    state: &AppState,
    name: &str,
    share_percentage: f64,
    base_salary: f64,
    actor: &Actor,
) -> Result<ObjectId> {
    validate_partner_fields(name, share_percentage, base_salary)?;

    let res = state
        .partners
        .insert_one(Partner {
            id: None,
            name: name.to_string(),
            share_percentage,
            base_salary,
            current_balance: 0.0,
            is_active: true,
            created_at: Some(now()),
            updated_at: None,
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("partner insert id"))?;

    record_history_best_effort(
        state,
        EntityKind::Partner,
        &id,
        doc! {},
        actor,
        ChangeType::Create,
        None,
    )
    .await;
    Ok(id)
}

pub async fn update_partner(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    share_percentage: f64,
    base_salary: f64,
    actor: &Actor,
) -> Result<()> {
    validate_partner_fields(name, share_percentage, base_salary)?;

    let existing = get_partner_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("partner"))?;
    let snapshot = bson::to_document(&existing)?;

    state
        .partners
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": name,
                "share_percentage": share_percentage,
                "base_salary": base_salary,
                "updated_at": now(),
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::Partner,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

/// Partners are never hard-deleted; deactivation ends their participation
/// while keeping every referenced statement intact.
pub async fn deactivate_partner(state: &AppState, id: &ObjectId, actor: &Actor) -> Result<()> {
    let existing = get_partner_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("partner"))?;
    let snapshot = bson::to_document(&existing)?;

    state
        .partners
        .update_one(
            doc! { "_id": id },
            doc! { "$set": { "is_active": false, "updated_at": now() } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::Partner,
        id,
        snapshot,
        actor,
        ChangeType::StatusChange,
        None,
    )
    .await;
    Ok(())
}

/// Advisory existence check backing the one-statement-per-month rule.
pub async fn partner_statement_exists(
    state: &AppState,
    partner_id: &ObjectId,
    month: i32,
    year: i32,
) -> Result<bool> {
    Ok(state
        .partner_statements
        .find_one(doc! { "partner_id": partner_id, "month": month, "year": year })
        .await?
        .is_some())
}

/// Convenience form of the advisory check: surfaces DuplicatePeriod as a
/// typed error the caller can show as a warning and then override by
/// calling `create_partner_statement` anyway.
pub async fn check_duplicate_period(
    state: &AppState,
    partner_id: &ObjectId,
    month: i32,
    year: i32,
) -> Result<()> {
    if partner_statement_exists(state, partner_id, month, year).await? {
        return Err(LedgerError::DuplicatePeriod {
            partner_id: partner_id.clone(),
            month,
            year,
        });
    }
    Ok(())
}

/// Creates a DRAFT partner statement for the given month.
///
/// `previous_balance_override` is the privileged escape hatch; without it
/// the opening balance chains from the most recent prior period's
/// `next_month_balance` (advisory, not enforced across manual edits).
pub async fn create_partner_statement(
    state: &AppState,
    partner_id: &ObjectId,
    month: i32,
    year: i32,
    personal_expense_reimbursement: f64,
    monthly_salary: f64,
    profit_share: f64,
    actual_withdrawn: f64,
    previous_balance_override: Option<f64>,
    note: Option<String>,
    actor: &Actor,
) -> Result<ObjectId> {
    validate_month(month)?;

    get_partner_by_id(state, partner_id)
        .await?
        .ok_or(LedgerError::NotFound("partner"))?;

    let previous_balance = match previous_balance_override {
        Some(value) => value,
        None => latest_statement(state, partner_id)
            .await?
            .map(|prior| prior.next_month_balance)
            .unwrap_or(0.0),
    };

    let next_month_balance = compute_partner_next_balance(
        previous_balance,
        personal_expense_reimbursement,
        monthly_salary,
        profit_share,
        actual_withdrawn,
    );

    let res = state
        .partner_statements
        .insert_one(PartnerStatement {
            id: None,
            partner_id: partner_id.clone(),
            month,
            year,
            status: StatementStatus::Draft,
            previous_balance,
            personal_expense_reimbursement,
            monthly_salary,
            profit_share,
            actual_withdrawn,
            next_month_balance,
            note,
            created_at: Some(now()),
            updated_at: None,
            created_by: Some(actor.uid.clone()),
            updated_by: None,
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("partner statement insert id"))?;

    record_history_best_effort(
        state,
        EntityKind::PartnerStatement,
        &id,
        doc! {},
        actor,
        ChangeType::Create,
        None,
    )
    .await;
    Ok(id)
}

pub async fn get_partner_statement_by_id(
    state: &AppState,
    id: &ObjectId,
) -> Result<Option<PartnerStatement>> {
    state
        .partner_statements
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn list_partner_statements(
    state: &AppState,
    partner_id: &ObjectId,
) -> Result<Vec<PartnerStatement>> {
    let mut cursor = state
        .partner_statements
        .find(doc! { "partner_id": partner_id })
        .sort(doc! { "year": -1, "month": -1 })
        .await?;
    let mut items = Vec::new();
    while let Some(statement) = cursor.try_next().await? {
        items.push(statement);
    }
    Ok(items)
}

/// Edits a DRAFT partner statement's input fields and recomputes
/// `next_month_balance`. `previous_balance` stays as-is; use
/// `override_partner_statement_previous_balance` for the privileged edit.
pub async fn update_partner_statement(
    state: &AppState,
    id: &ObjectId,
    personal_expense_reimbursement: f64,
    monthly_salary: f64,
    profit_share: f64,
    actual_withdrawn: f64,
    note: Option<String>,
    actor: &Actor,
) -> Result<()> {
    let existing = get_partner_statement_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("partner statement"))?;
    ensure_partner_statement_draft(&existing)?;
    let snapshot = bson::to_document(&existing)?;

    let next_month_balance = compute_partner_next_balance(
        existing.previous_balance,
        personal_expense_reimbursement,
        monthly_salary,
        profit_share,
        actual_withdrawn,
    );

    state
        .partner_statements
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "personal_expense_reimbursement": personal_expense_reimbursement,
                "monthly_salary": monthly_salary,
                "profit_share": profit_share,
                "actual_withdrawn": actual_withdrawn,
                "next_month_balance": next_month_balance,
                "note": note,
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::PartnerStatement,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

/// Privileged override of a DRAFT statement's opening balance (the chain
/// from the prior month is advisory, so corrections are allowed here).
pub async fn override_partner_statement_previous_balance(
    state: &AppState,
    id: &ObjectId,
    previous_balance: f64,
    actor: &Actor,
) -> Result<()> {
    let existing = get_partner_statement_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("partner statement"))?;
    ensure_partner_statement_draft(&existing)?;
    let snapshot = bson::to_document(&existing)?;

    let next_month_balance = compute_partner_next_balance(
        previous_balance,
        existing.personal_expense_reimbursement,
        existing.monthly_salary,
        existing.profit_share,
        existing.actual_withdrawn,
    );

    state
        .partner_statements
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "previous_balance": previous_balance,
                "next_month_balance": next_month_balance,
                "updated_at": now(),
                "updated_by": &actor.uid,
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::PartnerStatement,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

async fn latest_statement(
    state: &AppState,
    partner_id: &ObjectId,
) -> Result<Option<PartnerStatement>> {
    state
        .partner_statements
        .find_one(doc! { "partner_id": partner_id })
        .sort(doc! { "year": -1, "month": -1 })
        .await
        .map_err(Into::into)
}

fn validate_partner_fields(name: &str, share_percentage: f64, base_salary: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("partner name is required".into()));
    }
    if !(0.0..=100.0).contains(&share_percentage) {
        return Err(LedgerError::Validation(format!(
            "share percentage must be between 0 and 100 (got {share_percentage})"
        )));
    }
    if base_salary < 0.0 {
        return Err(LedgerError::Validation(
            "base salary must not be negative".into(),
        ));
    }
    Ok(())
}

fn validate_month(month: i32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(LedgerError::Validation(format!(
            "month must be between 1 and 12 (got {month})"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_partner_statement_draft(statement: &PartnerStatement) -> Result<()> {
    if statement.status.is_closed() {
        return Err(LedgerError::InvalidState(
            "partner statement is closed; reopen it before editing".into(),
        ));
    }
    Ok(())
}
