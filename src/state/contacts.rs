// Network/contacts ledger: CRM-style contact CRUD with the shared audit
// trail.

use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;

use crate::error::{LedgerError, Result};
use crate::models::{Actor, ChangeType, Contact, EntityKind};

use super::{AppState, now, record_history_best_effort};

pub async fn list_contacts(state: &AppState) -> Result<Vec<Contact>> {
    let mut cursor = state.contacts.find(doc! {}).sort(doc! { "name": 1 }).await?;
    let mut items = Vec::new();
    while let Some(contact) = cursor.try_next().await? {
        items.push(contact);
    }
    Ok(items)
}

pub async fn get_contact_by_id(state: &AppState, id: &ObjectId) -> Result<Option<Contact>> {
    state
        .contacts
        .find_one(doc! { "_id": id })
        .await
        .map_err(Into::into)
}

pub async fn create_contact(
    state: &AppState,
    name: &str,
    company: Option<String>,
    role: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    tags: Vec<String>,
    notes: Option<String>,
    actor: &Actor,
) -> Result<ObjectId> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("contact name is required".into()));
    }

    let res = state
        .contacts
        .insert_one(Contact {
            id: None,
            name: name.to_string(),
            company,
            role,
            email,
            phone,
            tags,
            notes,
            created_at: Some(now()),
            updated_at: None,
        })
        .await?;
    let id = res
        .inserted_id
        .as_object_id()
        .ok_or(LedgerError::NotFound("contact insert id"))?;

    record_history_best_effort(
        state,
        EntityKind::Contact,
        &id,
        doc! {},
        actor,
        ChangeType::Create,
        None,
    )
    .await;
    Ok(id)
}

pub async fn update_contact(
    state: &AppState,
    id: &ObjectId,
    name: &str,
    company: Option<String>,
    role: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    tags: Vec<String>,
    notes: Option<String>,
    actor: &Actor,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("contact name is required".into()));
    }

    let existing = get_contact_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("contact"))?;
    let snapshot = bson::to_document(&existing)?;

    state
        .contacts
        .update_one(
            doc! { "_id": id },
            doc! { "$set": {
                "name": name,
                "company": company,
                "role": role,
                "email": email,
                "phone": phone,
                "tags": tags,
                "notes": notes,
                "updated_at": now(),
            } },
        )
        .await?;

    record_history_best_effort(
        state,
        EntityKind::Contact,
        id,
        snapshot,
        actor,
        ChangeType::Update,
        None,
    )
    .await;
    Ok(())
}

pub async fn delete_contact(state: &AppState, id: &ObjectId, actor: &Actor) -> Result<()> {
    let existing = get_contact_by_id(state, id)
        .await?
        .ok_or(LedgerError::NotFound("contact"))?;
    let snapshot = bson::to_document(&existing)?;

    state.contacts.delete_one(doc! { "_id": id }).await?;

    record_history_best_effort(
        state,
        EntityKind::Contact,
        id,
        snapshot,
        actor,
        ChangeType::Delete,
        None,
    )
    .await;
    Ok(())
}
