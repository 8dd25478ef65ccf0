//! Conversions between entity models and domain types.

use sea_orm::{DbErr, Set};
use tally_core::ledger::{BankTransaction, JournalEntry, JournalLine};
use tally_core::reconciliation::Reconciliation;
use tally_core::recurring::RecurringEntry;
use tally_shared::types::JournalLineId;

use crate::entities::{
    bank_transactions, journal_entries, journal_lines, reconciliations, recurring_entries,
};

/// Builds a domain bank transaction from its row.
pub(crate) fn bank_transaction(model: bank_transactions::Model) -> BankTransaction {
    BankTransaction {
        id: model.id.into(),
        company_id: model.company_id.into(),
        bank_account_id: model.bank_account_id.into(),
        date: model.date,
        amount: model.amount,
        description: model.description,
        merchant: model.merchant,
        category_id: model.category_id.map(Into::into),
        ledger_status: model.ledger_status.into(),
        reconciliation_status: model.reconciliation_status.into(),
        reconciliation_id: model.reconciliation_id.map(Into::into),
    }
}

/// Copies the mutable fields of a domain transaction onto its row.
pub(crate) fn bank_transaction_changes(
    model: bank_transactions::Model,
    txn: &BankTransaction,
) -> bank_transactions::ActiveModel {
    let mut active: bank_transactions::ActiveModel = model.into();
    active.amount = Set(txn.amount);
    active.category_id = Set(txn.category_id.map(Into::into));
    active.ledger_status = Set(txn.ledger_status.into());
    active.reconciliation_status = Set(txn.reconciliation_status.into());
    active.reconciliation_id = Set(txn.reconciliation_id.map(Into::into));
    active.updated_at = Set(chrono::Utc::now().into());
    active
}

/// Builds a domain journal entry from its header and ordered lines.
pub(crate) fn journal_entry(
    model: journal_entries::Model,
    lines: Vec<journal_lines::Model>,
) -> JournalEntry {
    JournalEntry {
        id: model.id.into(),
        company_id: model.company_id.into(),
        entry_date: model.entry_date,
        memo: model.memo,
        source: model.source.into(),
        entry_type: model.entry_type.into(),
        transaction_id: model.transaction_id.map(Into::into),
        posted: model.posted,
        reversal_of_id: model.reversal_of_id.map(Into::into),
        reversed_by_id: model.reversed_by_id.map(Into::into),
        lines: lines
            .into_iter()
            .map(|line| JournalLine {
                account_id: line.account_id.into(),
                debit: line.debit,
                credit: line.credit,
                memo: line.memo,
            })
            .collect(),
    }
}

/// Builds the insert model for a journal entry header.
pub(crate) fn journal_entry_active(entry: &JournalEntry) -> journal_entries::ActiveModel {
    let now = chrono::Utc::now().into();
    journal_entries::ActiveModel {
        id: Set(entry.id.into()),
        company_id: Set(entry.company_id.into()),
        entry_date: Set(entry.entry_date),
        memo: Set(entry.memo.clone()),
        source: Set(entry.source.into()),
        entry_type: Set(entry.entry_type.into()),
        transaction_id: Set(entry.transaction_id.map(Into::into)),
        posted: Set(entry.posted),
        reversal_of_id: Set(entry.reversal_of_id.map(Into::into)),
        reversed_by_id: Set(entry.reversed_by_id.map(Into::into)),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Builds the insert models for a journal entry's lines.
pub(crate) fn journal_line_actives(entry: &JournalEntry) -> Vec<journal_lines::ActiveModel> {
    entry
        .lines
        .iter()
        .zip(0i32..)
        .map(|(line, order)| journal_lines::ActiveModel {
            id: Set(JournalLineId::new().into()),
            journal_entry_id: Set(entry.id.into()),
            account_id: Set(line.account_id.into()),
            debit: Set(line.debit),
            credit: Set(line.credit),
            memo: Set(line.memo.clone()),
            line_order: Set(order),
        })
        .collect()
}

/// Builds a domain reconciliation from its row.
pub(crate) fn reconciliation(model: reconciliations::Model) -> Reconciliation {
    Reconciliation {
        id: model.id.into(),
        company_id: model.company_id.into(),
        bank_account_id: model.bank_account_id.into(),
        statement_date: model.statement_date,
        statement_balance: model.statement_balance,
        book_balance: model.book_balance,
        difference: model.difference,
        status: model.status.into(),
        completed_at: model.completed_at.map(|at| at.with_timezone(&chrono::Utc)),
    }
}

/// Builds a domain recurring template from its row.
///
/// # Errors
///
/// Returns an error if the stored line JSON does not decode.
pub(crate) fn recurring_entry(model: recurring_entries::Model) -> Result<RecurringEntry, DbErr> {
    let lines: Vec<JournalLine> = serde_json::from_value(model.lines)
        .map_err(|e| DbErr::Json(format!("recurring entry {} lines: {e}", model.id)))?;
    let run_count = u32::try_from(model.run_count)
        .map_err(|_| DbErr::Custom(format!("recurring entry {} has a negative run count", model.id)))?;

    Ok(RecurringEntry {
        id: model.id.into(),
        company_id: model.company_id.into(),
        name: model.name,
        memo: model.memo,
        frequency: model.frequency.into(),
        start_date: model.start_date,
        next_run_date: model.next_run_date,
        end_date: model.end_date,
        auto_post: model.auto_post,
        run_count,
        is_active: model.is_active,
        lines,
    })
}
