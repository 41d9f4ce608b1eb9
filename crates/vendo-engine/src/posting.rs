//! # Double-Entry Ledger Poster
//!
//! Writes a balanced journal (header + exactly two entries) for a
//! monetary event and links it back to its source document.
//!
//! ## Best Effort, By Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The primary financial event (expense, payment) must succeed even       │
//! │  when ledger integration is unavailable. So:                            │
//! │                                                                         │
//! │  * bad request (amount <= 0, debit == credit)  → ERROR                  │
//! │  * ledger tables missing (capability set)       → SKIP, Ok(None)        │
//! │  * account unresolvable or inactive             → SKIP, Ok(None)        │
//! │  * posting itself fails mid-transaction         → ERROR, rolled back    │
//! │                                                                         │
//! │  A skip logs a warning and leaves the source document unposted so a     │
//! │  later backfill can find it (journal_id IS NULL).                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use vendo_core::{DocumentType, Journal, JournalEntry, SourceDocument, ValidationError};
use vendo_db::repository::journal::{generate_entry_id, generate_journal_id};
use vendo_db::Database;

use crate::context::TenantContext;
use crate::error::EngineResult;

/// A posting request for one monetary event: the amount moves from the
/// credit account to the debit account (no multi-line splits).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingRequest {
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub debit_account_id: String,
    pub credit_account_id: String,
    #[serde(default)]
    pub memo: Option<String>,
    /// The document this journal records (expense or payment).
    pub source: SourceDocument,
    pub source_id: String,
}

/// What a successful posting returns.
#[derive(Debug, Clone, Serialize)]
pub struct PostedJournal {
    pub journal_id: String,
    pub reference: String,
    pub debit_account_id: String,
    pub credit_account_id: String,
    pub amount_cents: i64,
}

/// The ledger posting service.
#[derive(Debug, Clone)]
pub struct LedgerPoster {
    db: Database,
}

impl LedgerPoster {
    /// Creates the service over a database handle.
    pub fn new(db: Database) -> Self {
        LedgerPoster { db }
    }

    /// Posts one balanced journal for a monetary event.
    ///
    /// Returns `Ok(None)` when posting was skipped under the best-effort
    /// policy; the source document is left unposted in that case.
    pub async fn post(
        &self,
        ctx: &TenantContext,
        request: &PostingRequest,
    ) -> EngineResult<Option<PostedJournal>> {
        ctx.validate()?;
        if request.amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount {
                field: "amount_cents".to_string(),
            }
            .into());
        }
        if request.debit_account_id == request.credit_account_id {
            return Err(ValidationError::SelfPosting {
                account_id: request.debit_account_id.clone(),
            }
            .into());
        }

        let caps = self.db.capabilities().await?;
        if !caps.ledger_posting {
            warn!(
                tenant_id = ctx.tenant_id,
                source = request.source.as_str(),
                source_id = %request.source_id,
                "Ledger tables unavailable, skipping journal posting"
            );
            return Ok(None);
        }

        // Both accounts must resolve for this tenant and be active;
        // anything else is a skip, not a failure
        let journals = self.db.journals();
        for account_id in [&request.debit_account_id, &request.credit_account_id] {
            match journals.get_account(ctx.tenant_id, account_id).await? {
                Some(account) if account.is_active => {}
                _ => {
                    warn!(
                        tenant_id = ctx.tenant_id,
                        account_id = %account_id,
                        source_id = %request.source_id,
                        "Ledger account unresolvable, skipping journal posting"
                    );
                    return Ok(None);
                }
            }
        }

        let now = Utc::now();
        let journal_id = generate_journal_id();

        let mut tx = self.db.pool().begin().await?;

        let reference = self
            .db
            .sequences()
            .next_code(
                &mut tx,
                ctx.tenant_id,
                DocumentType::Journal,
                request.date.year(),
            )
            .await?;

        journals
            .insert_journal(
                &mut tx,
                &Journal {
                    id: journal_id.clone(),
                    tenant_id: ctx.tenant_id,
                    journal_date: request.date,
                    reference: reference.clone(),
                    memo: request.memo.clone(),
                    source_type: Some(request.source.as_str().to_string()),
                    source_id: Some(request.source_id.clone()),
                    created_at: now,
                },
            )
            .await?;

        // Exactly two entries, equal by construction: the journal cannot
        // be out of balance
        journals
            .insert_entry(
                &mut tx,
                &JournalEntry {
                    id: generate_entry_id(),
                    journal_id: journal_id.clone(),
                    account_id: request.debit_account_id.clone(),
                    debit_cents: request.amount_cents,
                    credit_cents: 0,
                },
            )
            .await?;
        journals
            .insert_entry(
                &mut tx,
                &JournalEntry {
                    id: generate_entry_id(),
                    journal_id: journal_id.clone(),
                    account_id: request.credit_account_id.clone(),
                    debit_cents: 0,
                    credit_cents: request.amount_cents,
                },
            )
            .await?;

        self.db
            .finance()
            .link_journal(
                &mut tx,
                request.source,
                ctx.tenant_id,
                &request.source_id,
                &journal_id,
                now,
            )
            .await?;

        tx.commit().await?;

        info!(
            tenant_id = ctx.tenant_id,
            journal_id = %journal_id,
            reference = %reference,
            amount_cents = request.amount_cents,
            source = request.source.as_str(),
            source_id = %request.source_id,
            "Journal posted"
        );

        Ok(Some(PostedJournal {
            journal_id,
            reference,
            debit_account_id: request.debit_account_id.clone(),
            credit_account_id: request.credit_account_id.clone(),
            amount_cents: request.amount_cents,
        }))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testutil;
    use vendo_core::AccountKind;

    fn posting(
        amount_cents: i64,
        debit: &str,
        credit: &str,
        source: SourceDocument,
        source_id: &str,
    ) -> PostingRequest {
        PostingRequest {
            date: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            amount_cents,
            debit_account_id: debit.to_string(),
            credit_account_id: credit.to_string(),
            memo: Some("office rent".to_string()),
            source,
            source_id: source_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_expense_posts_a_balanced_two_entry_journal() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let rent = testutil::account(&engine, 1, "5000", AccountKind::Expense).await;
        let bank = testutil::account(&engine, 1, "1010", AccountKind::Asset).await;
        let expense = testutil::expense(&engine, 1, 500_00).await;

        let posted = engine
            .ledger()
            .post(
                &ctx,
                &posting(500_00, &rent.id, &bank.id, SourceDocument::Expense, &expense.id),
            )
            .await
            .unwrap()
            .expect("posting should not be skipped");

        assert_eq!(posted.reference, "JRN-2026-00001");
        assert_eq!(posted.amount_cents, 500_00);

        // Exactly two entries, debit E = credit B = 500.00
        let journals = engine.db().journals();
        let entries = journals.get_entries(&posted.journal_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_well_formed()));
        let (debits, credits) = journals.entry_totals(&posted.journal_id).await.unwrap();
        assert_eq!(debits, 500_00);
        assert_eq!(credits, 500_00);
        let debit_entry = entries.iter().find(|e| e.debit_cents > 0).unwrap();
        assert_eq!(debit_entry.account_id, rent.id);

        // Header carries the source link
        let journal = journals
            .get_by_id(1, &posted.journal_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(journal.source_type.as_deref(), Some("expense"));
        assert_eq!(journal.source_id.as_deref(), Some(expense.id.as_str()));

        // And the source document carries the one-way back-link
        let stored = engine
            .db()
            .finance()
            .get_expense(1, &expense.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.journal_id.as_deref(), Some(posted.journal_id.as_str()));
        assert!(stored.posted_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_ledger_tables_skip_without_failing() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let expense = testutil::expense(&engine, 1, 100_00).await;

        // Simulate a deployment without the accounting module. The
        // capability set is resolved per handle, so drop before first use.
        sqlx::query("DROP TABLE journal_entries")
            .execute(engine.db().pool())
            .await
            .unwrap();

        let outcome = engine
            .ledger()
            .post(
                &ctx,
                &posting(100_00, "a", "b", SourceDocument::Expense, &expense.id),
            )
            .await
            .unwrap();
        assert!(outcome.is_none());

        // The expense itself is untouched and still unposted
        let stored = engine
            .db()
            .finance()
            .get_expense(1, &expense.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.journal_id.is_none());
        assert!(stored.posted_at.is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_or_inactive_account_skips() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let rent = testutil::account(&engine, 1, "5000", AccountKind::Expense).await;
        let expense = testutil::expense(&engine, 1, 100_00).await;

        // Unknown credit account: skip
        let outcome = engine
            .ledger()
            .post(
                &ctx,
                &posting(100_00, &rent.id, "ghost", SourceDocument::Expense, &expense.id),
            )
            .await
            .unwrap();
        assert!(outcome.is_none());

        // Another tenant's account does not resolve here either
        let foreign = testutil::account(&engine, 2, "1010", AccountKind::Asset).await;
        let outcome = engine
            .ledger()
            .post(
                &ctx,
                &posting(100_00, &rent.id, &foreign.id, SourceDocument::Expense, &expense.id),
            )
            .await
            .unwrap();
        assert!(outcome.is_none());

        // A deactivated account skips too
        let dormant = vendo_core::Account {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: 1,
            code: "1099".to_string(),
            name: "Old Bank Account".to_string(),
            kind: AccountKind::Asset,
            is_active: false,
            created_at: chrono::Utc::now(),
        };
        engine.db().journals().insert_account(&dormant).await.unwrap();
        let outcome = engine
            .ledger()
            .post(
                &ctx,
                &posting(100_00, &rent.id, &dormant.id, SourceDocument::Expense, &expense.id),
            )
            .await
            .unwrap();
        assert!(outcome.is_none());

        // Nothing got posted through any of the skips
        let stored = engine
            .db()
            .finance()
            .get_expense(1, &expense.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.journal_id.is_none());
    }

    #[tokio::test]
    async fn test_bad_requests_error_instead_of_skipping() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let rent = testutil::account(&engine, 1, "5000", AccountKind::Expense).await;

        assert!(matches!(
            engine
                .ledger()
                .post(&ctx, &posting(0, "a", "b", SourceDocument::Expense, "x"))
                .await,
            Err(EngineError::Validation(
                ValidationError::NonPositiveAmount { .. }
            ))
        ));

        assert!(matches!(
            engine
                .ledger()
                .post(
                    &ctx,
                    &posting(100, &rent.id, &rent.id, SourceDocument::Expense, "x")
                )
                .await,
            Err(EngineError::Validation(ValidationError::SelfPosting { .. }))
        ));
    }

    #[tokio::test]
    async fn test_missing_source_document_rolls_the_journal_back() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let rent = testutil::account(&engine, 1, "5000", AccountKind::Expense).await;
        let bank = testutil::account(&engine, 1, "1010", AccountKind::Asset).await;

        let err = engine
            .ledger()
            .post(
                &ctx,
                &posting(100_00, &rent.id, &bank.id, SourceDocument::Expense, "no-such-doc"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Db(_)));

        // The journal written before the failed back-link was rolled back
        let journal_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM journals")
            .fetch_one(engine.db().pool())
            .await
            .unwrap();
        assert_eq!(journal_count, 0);
    }

    #[tokio::test]
    async fn test_payment_posting_links_the_payment_row() {
        let engine = testutil::engine().await;
        let ctx = testutil::ctx(1, 0);
        let cash = testutil::account(&engine, 1, "1000", AccountKind::Asset).await;
        let revenue = testutil::account(&engine, 1, "4000", AccountKind::Income).await;
        let payment = testutil::payment(&engine, 1, 250_00).await;

        let posted = engine
            .ledger()
            .post(
                &ctx,
                &posting(
                    250_00,
                    &cash.id,
                    &revenue.id,
                    SourceDocument::Payment,
                    &payment.id,
                ),
            )
            .await
            .unwrap()
            .unwrap();

        let stored = engine
            .db()
            .finance()
            .get_payment(1, &payment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.journal_id.as_deref(), Some(posted.journal_id.as_str()));

        // Posting the same document twice is refused by the link guard
        let err = engine
            .ledger()
            .post(
                &ctx,
                &posting(
                    250_00,
                    &cash.id,
                    &revenue.id,
                    SourceDocument::Payment,
                    &payment.id,
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Db(_)));
    }
}
