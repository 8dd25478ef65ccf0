//! Integration tests for keeping journal entries in step with bank
//! transactions.

mod common;

use common::{amount, date, setup};
use tally_core::coa::AccountType;
use tally_core::ledger::{
    EntrySource, JournalEntry, JournalEntryType, JournalLine, LedgerError, LedgerStatus,
    PeriodWindow, SyncPlan,
};
use tally_db::repositories::{
    BankTransactionRepository, ChartOfAccountRepository, CreateBankTransactionInput,
    CreateJournalEntryInput, JournalRepository,
};
use tally_shared::types::{ChartOfAccountId, TransactionId};

fn input(ctx: &common::TestContext, value: &str, description: &str) -> CreateBankTransactionInput {
    CreateBankTransactionInput {
        bank_account_id: ctx.bank_account_id,
        date: date(2026, 3, 10),
        amount: amount(value),
        description: description.to_string(),
        merchant: None,
    }
}

#[tokio::test]
async fn test_posting_creates_balanced_entry() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let txn = repo
        .create(ctx.company_id, input(&ctx, "-42.50", "Paper and toner"))
        .await
        .expect("create");
    repo.categorize(ctx.company_id, txn.id, Some(ctx.expense_id))
        .await
        .expect("categorize");
    let outcome = repo.post(ctx.company_id, txn.id).await.expect("post");

    assert_eq!(outcome.plan, SyncPlan::Upsert);
    assert_eq!(outcome.transaction.ledger_status, LedgerStatus::Posted);
    let entry = outcome.entry.expect("entry created");
    assert!(entry.posted);
    assert!(entry.is_balanced());
    assert_eq!(entry.source, EntrySource::Auto);
    assert_eq!(entry.transaction_id, Some(txn.id));
    assert_eq!(entry.lines.len(), 2);
    assert_eq!(entry.lines[0].account_id, ctx.expense_id);
    assert_eq!(entry.lines[0].debit, amount("42.50"));

    let bank_coa = ChartOfAccountRepository::new(ctx.db.clone())
        .resolve_or_create_bank_account(ctx.company_id, ctx.bank_account_id)
        .await
        .expect("bank coa");
    assert_eq!(
        entry.lines[1].account_id,
        ChartOfAccountId::from_uuid(bank_coa.id)
    );
    assert_eq!(entry.lines[1].credit, amount("42.50"));

    let linked = repo
        .linked_entry(ctx.company_id, txn.id)
        .await
        .expect("linked entry");
    assert_eq!(linked.map(|e| e.id), Some(entry.id));
}

#[tokio::test]
async fn test_posting_without_category_is_rejected() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let txn = repo
        .create(ctx.company_id, input(&ctx, "-10.00", "Unknown"))
        .await
        .expect("create");
    let result = repo.post(ctx.company_id, txn.id).await;

    assert!(matches!(result, Err(LedgerError::MissingCategory(_))));
    let stored = repo.get(ctx.company_id, txn.id).await.expect("get");
    assert_eq!(stored.ledger_status, LedgerStatus::Pending);
}

#[tokio::test]
async fn test_amount_change_resyncs_entry_in_place() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let txn = repo
        .create(ctx.company_id, input(&ctx, "-20.00", "Pens"))
        .await
        .expect("create");
    repo.categorize(ctx.company_id, txn.id, Some(ctx.expense_id))
        .await
        .expect("categorize");
    let first = repo
        .post(ctx.company_id, txn.id)
        .await
        .expect("post")
        .entry
        .expect("entry");

    let second = repo
        .update_amount(ctx.company_id, txn.id, amount("-25.00"))
        .await
        .expect("update amount")
        .entry
        .expect("entry");

    assert_eq!(first.id, second.id);
    assert_eq!(second.totals().debit, amount("25.00"));
    assert!(second.is_balanced());
}

#[tokio::test]
async fn test_unposting_removes_entry() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let txn = repo
        .create(ctx.company_id, input(&ctx, "150.00", "Invoice 17"))
        .await
        .expect("create");
    repo.categorize(ctx.company_id, txn.id, Some(ctx.income_id))
        .await
        .expect("categorize");
    repo.post(ctx.company_id, txn.id).await.expect("post");

    let outcome = repo
        .mark_pending(ctx.company_id, txn.id)
        .await
        .expect("mark pending");

    assert_eq!(outcome.plan, SyncPlan::Remove);
    assert!(outcome.entry.is_none());
    let linked = repo
        .linked_entry(ctx.company_id, txn.id)
        .await
        .expect("linked entry");
    assert!(linked.is_none());
}

#[tokio::test]
async fn test_removing_category_from_posted_forces_pending() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let txn = repo
        .create(ctx.company_id, input(&ctx, "-5.00", "Coffee"))
        .await
        .expect("create");
    repo.categorize(ctx.company_id, txn.id, Some(ctx.expense_id))
        .await
        .expect("categorize");
    repo.post(ctx.company_id, txn.id).await.expect("post");

    let outcome = repo
        .categorize(ctx.company_id, txn.id, None)
        .await
        .expect("clear category");

    assert_eq!(outcome.plan, SyncPlan::ForcePendingAndRemove);
    assert_eq!(outcome.transaction.ledger_status, LedgerStatus::Pending);
    assert!(outcome.entry.is_none());
}

#[tokio::test]
async fn test_categorizing_with_inactive_account_is_rejected() {
    let ctx = setup().await;
    let accounts = ChartOfAccountRepository::new(ctx.db.clone());
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let retired = common::add_account(&ctx, "6900", AccountType::Expense).await;
    accounts
        .deactivate(ctx.company_id, retired)
        .await
        .expect("deactivate");
    let txn = repo
        .create(ctx.company_id, input(&ctx, "-8.00", "Stamps"))
        .await
        .expect("create");

    let result = repo.categorize(ctx.company_id, txn.id, Some(retired)).await;
    assert!(matches!(result, Err(LedgerError::AccountNotFound(id)) if id == retired));
}

#[tokio::test]
async fn test_bank_account_resolution_is_idempotent() {
    let ctx = setup().await;
    let accounts = ChartOfAccountRepository::new(ctx.db.clone());

    let (first, second) = tokio::join!(
        accounts.resolve_or_create_bank_account(ctx.company_id, ctx.bank_account_id),
        accounts.resolve_or_create_bank_account(ctx.company_id, ctx.bank_account_id),
    );
    let first = first.expect("first resolve");
    let second = second.expect("second resolve");

    assert_eq!(first.id, second.id);
    assert!(first.system_generated);
    assert_eq!(first.bank_account_id, Some(ctx.bank_account_id.into_inner()));
}

#[tokio::test]
async fn test_bank_balance_follows_posted_transactions() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    for (value, category) in [("-42.50", ctx.expense_id), ("100.00", ctx.income_id)] {
        let txn = repo
            .create(ctx.company_id, input(&ctx, value, "Activity"))
            .await
            .expect("create");
        repo.categorize(ctx.company_id, txn.id, Some(category))
            .await
            .expect("categorize");
        repo.post(ctx.company_id, txn.id).await.expect("post");
    }
    // Pending transactions stay off the ledger.
    repo.create(ctx.company_id, input(&ctx, "-999.00", "Pending"))
        .await
        .expect("create");

    let bank_coa = ChartOfAccountRepository::new(ctx.db.clone())
        .resolve_or_create_bank_account(ctx.company_id, ctx.bank_account_id)
        .await
        .expect("bank coa");
    let balance = JournalRepository::new(ctx.db.clone())
        .period_balance(
            ctx.company_id,
            ChartOfAccountId::from_uuid(bank_coa.id),
            PeriodWindow::all_time(),
        )
        .await
        .expect("balance");

    assert_eq!(balance.account_type, AccountType::Asset);
    assert_eq!(balance.balance, amount("57.50"));
}

#[tokio::test]
async fn test_manual_entry_reversal() {
    let ctx = setup().await;
    let journal = JournalRepository::new(ctx.db.clone());

    let entry = journal
        .create_manual(
            ctx.company_id,
            CreateJournalEntryInput {
                entry_date: date(2026, 3, 31),
                memo: Some("Accrue supplies".to_string()),
                entry_type: JournalEntryType::Adjusting,
                lines: vec![
                    JournalLine::debit(ctx.expense_id, amount("300.00"), None),
                    JournalLine::credit(ctx.income_id, amount("300.00"), None),
                ],
                post: true,
            },
        )
        .await
        .expect("create manual");

    let reversed = journal
        .reverse(ctx.company_id, entry.id, date(2026, 4, 1), None)
        .await
        .expect("reverse");

    assert_eq!(reversed.original.reversed_by_id, Some(reversed.reversal.id));
    assert_eq!(reversed.reversal.reversal_of_id, Some(entry.id));
    assert_eq!(reversed.reversal.lines[0].credit, amount("300.00"));
    assert!(reversed.reversal.posted);

    let again = journal
        .reverse(ctx.company_id, entry.id, date(2026, 4, 2), None)
        .await;
    assert!(matches!(again, Err(LedgerError::AlreadyReversed(_))));
}

#[tokio::test]
async fn test_synchronized_entry_cannot_be_reversed() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());

    let txn = repo
        .create(ctx.company_id, input(&ctx, "-12.00", "Lunch"))
        .await
        .expect("create");
    repo.categorize(ctx.company_id, txn.id, Some(ctx.expense_id))
        .await
        .expect("categorize");
    let entry = repo
        .post(ctx.company_id, txn.id)
        .await
        .expect("post")
        .entry
        .expect("entry");

    let result = JournalRepository::new(ctx.db.clone())
        .reverse(ctx.company_id, entry.id, date(2026, 3, 11), None)
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::CannotReverseSynchronized(_))
    ));
}

async fn posted(
    ctx: &common::TestContext,
    repo: &BankTransactionRepository,
    value: &str,
) -> (TransactionId, JournalEntry) {
    let txn = repo
        .create(ctx.company_id, input(ctx, value, "Supplies"))
        .await
        .expect("create");
    repo.categorize(ctx.company_id, txn.id, Some(ctx.expense_id))
        .await
        .expect("categorize");
    let entry = repo
        .post(ctx.company_id, txn.id)
        .await
        .expect("post")
        .entry
        .expect("entry");
    (txn.id, entry)
}

#[tokio::test]
async fn test_deleting_posted_transaction_removes_entry() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());
    let (txn_id, entry) = posted(&ctx, &repo, "-64.00").await;

    repo.delete(ctx.company_id, txn_id).await.expect("delete");

    let stored = repo.get(ctx.company_id, txn_id).await;
    assert!(matches!(stored, Err(LedgerError::TransactionNotFound(id)) if id == txn_id));
    let gone = JournalRepository::new(ctx.db.clone())
        .get(ctx.company_id, entry.id)
        .await;
    assert!(matches!(gone, Err(LedgerError::EntryNotFound(id)) if id == entry.id));
}

#[tokio::test]
async fn test_excluding_posted_transaction_removes_entry() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());
    let (txn_id, entry) = posted(&ctx, &repo, "-18.25").await;

    let outcome = repo.exclude(ctx.company_id, txn_id).await.expect("exclude");

    assert_eq!(outcome.plan, SyncPlan::Remove);
    assert_eq!(outcome.transaction.ledger_status, LedgerStatus::Excluded);
    assert!(outcome.entry.is_none());
    let linked = repo
        .linked_entry(ctx.company_id, txn_id)
        .await
        .expect("linked entry");
    assert!(linked.is_none());
    let gone = JournalRepository::new(ctx.db.clone())
        .get(ctx.company_id, entry.id)
        .await;
    assert!(matches!(gone, Err(LedgerError::EntryNotFound(_))));
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    let ctx = setup().await;
    let repo = BankTransactionRepository::new(ctx.db.clone());
    let (txn_id, entry) = posted(&ctx, &repo, "-33.10").await;

    let first = repo.resync(ctx.company_id, txn_id).await.expect("resync");
    let second = repo.resync(ctx.company_id, txn_id).await.expect("resync again");

    let sides = |e: &JournalEntry| {
        e.lines
            .iter()
            .map(|l| (l.account_id, l.debit, l.credit))
            .collect::<Vec<_>>()
    };
    assert_eq!(first.plan, SyncPlan::Upsert);
    assert_eq!(second.plan, SyncPlan::Upsert);
    let first = first.entry.expect("entry after resync");
    let second = second.entry.expect("entry after second resync");
    assert_eq!(first.id, entry.id);
    assert_eq!(second.id, entry.id);
    assert_eq!(sides(&first), sides(&entry));
    assert_eq!(sides(&second), sides(&first));
    assert!(second.is_balanced());

    let linked = repo
        .linked_entry(ctx.company_id, txn_id)
        .await
        .expect("linked entry")
        .expect("still linked");
    assert_eq!(linked.id, entry.id);
    assert_eq!(sides(&linked), sides(&entry));
}
