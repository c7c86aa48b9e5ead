// ledger.rs
// Balance ledger primitive: pure computation of a period's derived totals
// and ending balance from its inputs and line items. No I/O; safe to
// re-run at any time from stored inputs, which is what makes the
// recalculation engine idempotent.

use crate::error::{LedgerError, Result};
use crate::models::{LineDirection, StatementLine, StatementTotals};

/// Result of recomputing a shipyard statement from its line items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedTotals {
    pub totals: StatementTotals,
    pub final_balance: f64,
}

/// Computes a shipyard statement's totals and final balance.
///
/// Income counts regardless of the paid flag. Both paid and unpaid
/// expenses reduce the net result: unpaid lines model committed
/// obligations, not just cash already disbursed.
///
/// A negative line amount is a caller error and is rejected rather than
/// silently coerced.
pub fn compute_shipyard_totals(
    lines: &[StatementLine],
    previous_balance: f64,
) -> Result<ComputedTotals> {
    let mut totals = StatementTotals::default();

    for line in lines {
        if line.amount < 0.0 {
            return Err(LedgerError::Validation(format!(
                "line amount must not be negative (got {})",
                line.amount
            )));
        }
        match line.direction {
            LineDirection::Income => totals.total_income += line.amount,
            LineDirection::Expense => {
                if line.is_paid {
                    totals.total_expense_paid += line.amount;
                } else {
                    totals.total_expense_unpaid += line.amount;
                }
            }
        }
    }

    totals.net_cash_real =
        totals.total_income - (totals.total_expense_paid + totals.total_expense_unpaid);

    Ok(ComputedTotals {
        totals,
        final_balance: previous_balance + totals.net_cash_real,
    })
}

/// Computes a partner's end-of-month balance. Total function; the sign of
/// the result is meaningful (positive = company owes partner).
pub fn compute_partner_next_balance(
    previous_balance: f64,
    reimbursement: f64,
    salary: f64,
    profit_share: f64,
    withdrawn: f64,
) -> f64 {
    previous_balance + reimbursement + salary + profit_share - withdrawn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(direction: LineDirection, amount: f64, is_paid: bool) -> StatementLine {
        StatementLine {
            id: None,
            statement_id: bson::oid::ObjectId::new(),
            direction,
            category: "test".into(),
            amount,
            is_paid,
            description: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn net_cash_formula_matches_reference_vector() {
        let lines = vec![
            line(LineDirection::Income, 1000.0, true),
            line(LineDirection::Expense, 300.0, true),
            line(LineDirection::Expense, 200.0, false),
        ];
        let computed = compute_shipyard_totals(&lines, 0.0).unwrap();
        assert_eq!(computed.totals.total_income, 1000.0);
        assert_eq!(computed.totals.total_expense_paid, 300.0);
        assert_eq!(computed.totals.total_expense_unpaid, 200.0);
        assert_eq!(computed.totals.net_cash_real, 500.0);
        assert_eq!(computed.final_balance, 500.0);
    }

    #[test]
    fn income_counts_regardless_of_paid_flag() {
        let lines = vec![
            line(LineDirection::Income, 400.0, true),
            line(LineDirection::Income, 600.0, false),
        ];
        let computed = compute_shipyard_totals(&lines, 0.0).unwrap();
        assert_eq!(computed.totals.total_income, 1000.0);
        assert_eq!(computed.totals.net_cash_real, 1000.0);
    }

    #[test]
    fn previous_balance_feeds_final_balance() {
        let lines = vec![line(LineDirection::Expense, 250.0, true)];
        let computed = compute_shipyard_totals(&lines, 1000.0).unwrap();
        assert_eq!(computed.totals.net_cash_real, -250.0);
        assert_eq!(computed.final_balance, 750.0);
    }

    #[test]
    fn empty_statement_keeps_previous_balance() {
        let computed = compute_shipyard_totals(&[], 123.45).unwrap();
        assert_eq!(computed.totals, StatementTotals::default());
        assert_eq!(computed.final_balance, 123.45);
    }

    #[test]
    fn negative_amount_is_rejected() {
        let lines = vec![line(LineDirection::Income, -1.0, true)];
        let err = compute_shipyard_totals(&lines, 0.0).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn recompute_is_deterministic() {
        let lines = vec![
            line(LineDirection::Income, 1500.0, true),
            line(LineDirection::Expense, 700.0, false),
        ];
        let a = compute_shipyard_totals(&lines, 50.0).unwrap();
        let b = compute_shipyard_totals(&lines, 50.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partner_formula_matches_reference_vector() {
        let next = compute_partner_next_balance(0.0, 33250.0, 100000.0, 13972.0, 160000.0);
        assert_eq!(next, -12778.0);
    }

    #[test]
    fn partner_formula_positive_means_company_owes() {
        let next = compute_partner_next_balance(1000.0, 0.0, 5000.0, 0.0, 2000.0);
        assert_eq!(next, 4000.0);
    }
}
