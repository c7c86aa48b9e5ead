// models.rs
// Domain documents for the MongoDB collections: shipyards, progress-payment
// statements and their line items, partners and their monthly statements,
// company expenses, contacts, and the audit history ledger.

use bson::{DateTime, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Identity of the acting user, stamped onto audit records and
/// `created_by`/`updated_by` fields. Supplied by the identity provider;
/// the core only requires that one is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub email: String,
    pub display_name: String,
}

/// Mutable/frozen state of a statement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementStatus {
    Draft,
    Closed,
}

impl StatementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementStatus::Draft => "draft",
            StatementStatus::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, StatementStatus::Closed)
    }
}

/// What happened to a shipyard statement's ending balance when it closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferAction {
    /// Statement is still open (or was reopened); no transfer decided.
    None,
    /// Ending balance swept to the company safe; shipyard balance resets to zero.
    TransferredToSafe,
    /// Ending balance becomes the shipyard's new running balance.
    CarriedOver,
}

impl TransferAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferAction::None => "none",
            TransferAction::TransferredToSafe => "transferred_to_safe",
            TransferAction::CarriedOver => "carried_over",
        }
    }
}

/// Direction of a statement line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDirection {
    Income,
    Expense,
}

impl LineDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineDirection::Income => "income",
            LineDirection::Expense => "expense",
        }
    }
}

/// Shipyard (counterparty) against which progress-payment statements run.
/// `current_balance` is the money currently held inside the yard; it is
/// mutated only when a statement closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipyard {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub location: String,
    pub current_balance: f64,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub created_by: Option<String>,
}

/// Derived totals of a shipyard statement. Always a pure function of the
/// statement's line items; persisted only by the recalculation engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTotals {
    pub total_income: f64,
    pub total_expense_paid: f64,
    pub total_expense_unpaid: f64,
    pub net_cash_real: f64,
}

/// A progress-payment (hakediş) statement: one bounded accounting period
/// for a shipyard. `totals` and `final_balance` are derived fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipyardStatement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub shipyard_id: ObjectId,
    pub title: String,
    pub date: DateTime,
    pub status: StatementStatus,
    pub previous_balance: f64,
    pub totals: StatementTotals,
    pub final_balance: f64,
    pub transfer_action: TransferAction,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

/// A single income or expense entry inside a shipyard statement.
/// For expense lines `is_paid` distinguishes realized from committed but
/// unpaid; for income lines it distinguishes realized from forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLine {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub statement_id: ObjectId,
    pub direction: LineDirection,
    pub category: String,
    pub amount: f64,
    pub is_paid: bool,
    pub description: String,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// Company partner (owner). `current_balance` sign convention: positive
/// means the company owes the partner, negative means the partner owes
/// the company. Partners are deactivated, never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partner {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub share_percentage: f64,
    pub base_salary: f64,
    pub current_balance: f64,
    pub is_active: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// One partner statement per partner per calendar month.
/// `next_month_balance` is derived; uniqueness of (partner, month, year)
/// is advisory only (pre-create existence check, no hard constraint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerStatement {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub partner_id: ObjectId,
    pub month: i32,
    pub year: i32,
    pub status: StatementStatus,
    pub previous_balance: f64,
    pub personal_expense_reimbursement: f64,
    pub monthly_salary: f64,
    pub profit_share: f64,
    pub actual_withdrawn: f64,
    pub next_month_balance: f64,
    pub note: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    CompanyOfficial,
    Personal,
    Advance,
}

impl ExpenseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseType::CompanyOfficial => "company_official",
            ExpenseType::Personal => "personal",
            ExpenseType::Advance => "advance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    Paid,
    Unpaid,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Paid => "paid",
            ExpenseStatus::Unpaid => "unpaid",
        }
    }
}

/// Standalone company expense, independent of the statement ledger.
/// Soft-deleted via `is_deleted` so the audit trail keeps pointing at a
/// live document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub amount: f64,
    pub description: String,
    pub date: DateTime,
    pub expense_type: ExpenseType,
    pub status: ExpenseStatus,
    pub owner: String,
    pub currency: String,
    pub payment_method: String,
    pub receipt_ref: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
    pub created_by: Option<String>,
}

/// CRM-style network contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime>,
    pub updated_at: Option<DateTime>,
}

/// Which entity type a history entry belongs to. Stands in for the
/// per-entity sub-collections of the original store: ownership is the
/// compound key (entity_kind, entity_id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Shipyard,
    ShipyardStatement,
    Partner,
    PartnerStatement,
    Expense,
    Contact,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Shipyard => "shipyard",
            EntityKind::ShipyardStatement => "shipyard_statement",
            EntityKind::Partner => "partner",
            EntityKind::PartnerStatement => "partner_statement",
            EntityKind::Expense => "expense",
            EntityKind::Contact => "contact",
        }
    }

    /// MongoDB collection the entity documents live in.
    pub fn collection_name(&self) -> &'static str {
        match self {
            EntityKind::Shipyard => "shipyards",
            EntityKind::ShipyardStatement => "shipyard_statements",
            EntityKind::Partner => "partners",
            EntityKind::PartnerStatement => "partner_statements",
            EntityKind::Expense => "expenses",
            EntityKind::Contact => "contacts",
        }
    }
}

/// Discriminant for history entries; doubles as the tag telling consumers
/// whether the entry concerns a whole document or a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
    Revert,
    StatusChange,
    LineAdd,
    LineUpdate,
    LineDelete,
    Close,
    Reopen,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Update => "update",
            ChangeType::Delete => "delete",
            ChangeType::Revert => "revert",
            ChangeType::StatusChange => "status_change",
            ChangeType::LineAdd => "line_add",
            ChangeType::LineUpdate => "line_update",
            ChangeType::LineDelete => "line_delete",
            ChangeType::Close => "close",
            ChangeType::Reopen => "reopen",
        }
    }
}

/// Line-specific fields attached to a history entry when the change
/// concerns a child line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineDelta {
    pub line_id: ObjectId,
    pub description: String,
    pub amount: f64,
    pub direction: LineDirection,
}

/// One immutable audit record. `previous_data` is the full pre-mutation
/// document, so revert means "re-apply this snapshot". Entries are
/// appended exactly once per mutating operation and never touched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub entity_kind: EntityKind,
    pub entity_id: ObjectId,
    pub change_type: ChangeType,
    pub previous_data: Document,
    pub changed_at: DateTime,
    pub actor: Actor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineDelta>,
}
