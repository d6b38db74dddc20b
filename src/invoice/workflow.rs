use crate::database::models::{InvoiceDraft, InvoiceRecord, UserProfile};
use crate::database::stores::{CounterStore, InvoiceStore, ProfileStore, WorkLogStore};
use crate::error::{AppError, AppResult, Precondition};
use crate::invoice::engine::{BillingPeriod, preview_invoice};
use crate::invoice::materializer::{DocumentRenderer, ShareSurface};
use crate::invoice::render::render_invoice_document;
use crate::utils::validation::is_profile_complete;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::Mutex;

/// What the preview screen shows: the draft plus the profile it was priced with.
#[derive(Debug, Clone)]
pub struct InvoicePreview {
    pub draft: InvoiceDraft,
    pub profile: Option<UserProfile>,
}

impl InvoicePreview {
    /// Whether issuing this draft could succeed right now.
    pub fn can_issue(&self) -> bool {
        self.profile.as_ref().is_some_and(is_profile_complete) && !self.draft.is_empty()
    }
}

/// Result of the one-step "Generate" action.
///
/// The invoice is issued even when its document could not be produced; the
/// failure is reported alongside so it can be regenerated later.
#[derive(Debug)]
pub struct GeneratedInvoice {
    pub record: InvoiceRecord,
    pub document_error: Option<AppError>,
}

pub struct InvoiceService {
    work_logs: Arc<dyn WorkLogStore>,
    invoices: Arc<dyn InvoiceStore>,
    counter: Arc<dyn CounterStore>,
    profiles: ProfileStore,
    renderer: Arc<dyn DocumentRenderer>,
    issuance: Mutex<()>,
    // Serializes every load-modify-save of the invoice history.
    history_writes: Mutex<()>,
}

impl InvoiceService {
    pub fn new(
        work_logs: Arc<dyn WorkLogStore>,
        invoices: Arc<dyn InvoiceStore>,
        counter: Arc<dyn CounterStore>,
        profiles: ProfileStore,
        renderer: Arc<dyn DocumentRenderer>,
    ) -> Self {
        Self {
            work_logs,
            invoices,
            counter,
            profiles,
            renderer,
            issuance: Mutex::new(()),
            history_writes: Mutex::new(()),
        }
    }

    /// Number the next issued invoice will get.
    ///
    /// Never lower than anything already in history, even if the stored
    /// counter lags behind a record that was written without its counter.
    pub async fn next_number(&self) -> AppResult<u32> {
        let counter = self.counter.get().await.map_err(AppError::Persistence)?;
        let history = self.history().await?;
        let after_history = history
            .iter()
            .map(|record| record.number)
            .max()
            .map_or(1, |highest| highest.saturating_add(1));

        Ok(counter.max(after_history))
    }

    pub async fn prepare_draft(
        &self,
        period: &BillingPeriod,
        gst_included: bool,
        issue_date: NaiveDate,
    ) -> AppResult<InvoicePreview> {
        let profile = self.profiles.get().await.map_err(AppError::Persistence)?;
        let entries = self.work_logs.load().await.map_err(AppError::Persistence)?;
        let number = self.next_number().await?;

        let rate = profile.as_ref().map_or(0.0, |profile| profile.hourly_rate);
        let draft = preview_invoice(&entries, period, rate, gst_included, number, issue_date);

        Ok(InvoicePreview { draft, profile })
    }

    /// Draft → Issued. Persists the record, then advances the counter.
    pub async fn issue_invoice(&self, draft: InvoiceDraft) -> AppResult<InvoiceRecord> {
        let _guard = self
            .issuance
            .try_lock()
            .map_err(|_| Precondition::IssuanceInProgress)?;

        self.require_profile().await?;

        if draft.is_empty() {
            let record = draft.record();
            return Err(Precondition::EmptyPeriod {
                start: record.period_start.to_string(),
                end: record.period_end.to_string(),
            }
            .into());
        }

        let number = self.next_number().await?;
        if draft.record().number != number {
            tracing::warn!(
                draft = draft.record().number,
                current = number,
                "Rejected stale invoice draft"
            );
            return Err(Precondition::StaleDraft {
                draft: draft.record().number,
                current: number,
            }
            .into());
        }

        let record = draft.into_issued(number);

        {
            let _history = self.history_writes.lock().await;
            let mut history = self.history().await?;
            history.insert(0, record.clone());
            self.invoices
                .save(&history)
                .await
                .map_err(AppError::Persistence)?;
        }

        // History already holds the record, so a lagging counter is corrected
        // by `next_number` on the next issuance.
        if let Err(e) = self.counter.set(number.saturating_add(1)).await {
            tracing::warn!(number, "Failed to advance invoice counter: {:#}", e);
        }

        tracing::info!(
            number,
            total = record.total,
            items = record.items.len(),
            "Issued invoice"
        );
        Ok(record)
    }

    /// Issued → Materialized. A record that already has a document is returned as is.
    pub async fn materialize_document(
        &self,
        profile: &UserProfile,
        record: InvoiceRecord,
    ) -> AppResult<InvoiceRecord> {
        if record.document_uri.is_some() {
            return Ok(record);
        }
        self.render_and_store(profile, &record).await
    }

    /// Re-renders the stored record. On failure the previous document stays attached.
    pub async fn regenerate_document(&self, number: u32) -> AppResult<InvoiceRecord> {
        let profile = self.require_profile().await?;
        let record = self.find_invoice(number).await?;
        self.render_and_store(&profile, &record).await
    }

    pub async fn share_invoice(
        &self,
        number: u32,
        surface: &dyn ShareSurface,
    ) -> AppResult<InvoiceRecord> {
        let mut record = self.find_invoice(number).await?;
        if record.document_uri.is_none() {
            let profile = self.require_profile().await?;
            record = self.materialize_document(&profile, record).await?;
        }

        let Some(uri) = record.document_uri.clone() else {
            return Err(AppError::Materialization(anyhow::anyhow!(
                "Invoice #{} has no document",
                number
            )));
        };

        if !surface.is_available(&uri).await {
            return Err(AppError::SharingUnavailable);
        }
        if let Err(e) = surface.share(&uri).await {
            tracing::warn!(number, "Sharing invoice document failed: {:#}", e);
            return Err(AppError::SharingUnavailable);
        }

        tracing::info!(number, "Shared invoice document");
        Ok(record)
    }

    /// Prepares, issues and materializes in one step for the period shown in
    /// a preview. `expected_number` and `expected_fingerprint` are the number
    /// and [`InvoiceDraft::fingerprint`] that preview displayed; the invoice
    /// is refused if the work log no longer produces the same lines.
    pub async fn generate_invoice(
        &self,
        period: &BillingPeriod,
        gst_included: bool,
        expected_number: u32,
        expected_fingerprint: &str,
        issue_date: NaiveDate,
    ) -> AppResult<GeneratedInvoice> {
        let preview = self.prepare_draft(period, gst_included, issue_date).await?;
        let current = preview.draft.record().number;
        if current != expected_number {
            return Err(Precondition::StaleDraft {
                draft: expected_number,
                current,
            }
            .into());
        }
        if preview.draft.fingerprint() != expected_fingerprint {
            tracing::warn!(number = current, "Rejected invoice: work log changed since preview");
            return Err(Precondition::PreviewChanged.into());
        }

        let record = self.issue_invoice(preview.draft).await?;

        let Some(profile) = preview.profile else {
            return Err(Precondition::ProfileIncomplete.into());
        };

        match self.materialize_document(&profile, record.clone()).await {
            Ok(record) => Ok(GeneratedInvoice {
                record,
                document_error: None,
            }),
            Err(e) => {
                tracing::error!(number = record.number, "Invoice issued without document: {}", e);
                Ok(GeneratedInvoice {
                    record,
                    document_error: Some(e),
                })
            }
        }
    }

    pub async fn history(&self) -> AppResult<Vec<InvoiceRecord>> {
        self.invoices.load().await.map_err(AppError::Persistence)
    }

    pub async fn find_invoice(&self, number: u32) -> AppResult<InvoiceRecord> {
        self.history()
            .await?
            .into_iter()
            .find(|record| record.number == number)
            .ok_or(AppError::NotFound(number))
    }

    async fn require_profile(&self) -> AppResult<UserProfile> {
        match self.profiles.get().await.map_err(AppError::Persistence)? {
            Some(profile) if is_profile_complete(&profile) => Ok(profile),
            _ => Err(Precondition::ProfileIncomplete.into()),
        }
    }

    async fn render_and_store(
        &self,
        profile: &UserProfile,
        record: &InvoiceRecord,
    ) -> AppResult<InvoiceRecord> {
        let markup = render_invoice_document(profile, record);
        let uri = self
            .renderer
            .render(&markup, &record.id())
            .await
            .map_err(AppError::Materialization)?;

        let _history = self.history_writes.lock().await;
        let mut history = self.history().await?;
        let stored = history
            .iter_mut()
            .find(|stored| stored.number == record.number)
            .ok_or(AppError::NotFound(record.number))?;
        stored.document_uri = Some(uri);
        let updated = stored.clone();

        self.invoices
            .save(&history)
            .await
            .map_err(AppError::Persistence)?;

        tracing::info!(number = updated.number, "Materialized invoice document");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::{
        MemoryConfidentialStore, MemoryCounterStore, MemoryInvoiceStore, MemoryWorkLogStore,
    };
    use crate::database::models::{InvoiceState, WorkLogEntry};
    use crate::invoice::materializer::{MockDocumentRenderer, MockShareSurface};
    use crate::utils::time::DateKey;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    struct Harness {
        service: InvoiceService,
        work_logs: Arc<MemoryWorkLogStore>,
        invoices: Arc<MemoryInvoiceStore>,
        counter: Arc<MemoryCounterStore>,
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period() -> BillingPeriod {
        BillingPeriod::week_of(date(2024, 8, 21))
    }

    fn entry(day: u32, hours: f64) -> WorkLogEntry {
        let key = DateKey::from(date(2024, 8, day));
        WorkLogEntry {
            id: WorkLogEntry::entry_id(&key),
            date: key,
            hours,
            description: format!("Day {day}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            full_name: "Alex Doe".to_string(),
            email: "alex@example.com".to_string(),
            address: "1 Example St".to_string(),
            phone: "0400 000 000".to_string(),
            abn: "12 345 678 901".to_string(),
            hourly_rate: 85.0,
        }
    }

    fn counting_renderer() -> MockDocumentRenderer {
        let mut renderer = MockDocumentRenderer::new();
        renderer
            .expect_render()
            .returning(|_, name| Ok(format!("/docs/{name}.html")));
        renderer
    }

    async fn harness(
        entries: Vec<WorkLogEntry>,
        profile: Option<UserProfile>,
        counter_start: u32,
        renderer: MockDocumentRenderer,
    ) -> Harness {
        let work_logs = Arc::new(MemoryWorkLogStore::with_entries(entries));
        let invoices = Arc::new(MemoryInvoiceStore::default());
        let counter = Arc::new(MemoryCounterStore::starting_at(counter_start));
        let profiles = ProfileStore::new(Arc::new(MemoryConfidentialStore::default()));
        if let Some(profile) = profile {
            profiles.set(&profile).await.unwrap();
        }

        let service = InvoiceService::new(
            work_logs.clone(),
            invoices.clone(),
            counter.clone(),
            profiles,
            Arc::new(renderer),
        );

        Harness {
            service,
            work_logs,
            invoices,
            counter,
        }
    }

    async fn week_harness(counter_start: u32) -> Harness {
        harness(
            vec![entry(19, 7.5), entry(20, 8.0), entry(21, 7.0)],
            Some(profile()),
            counter_start,
            counting_renderer(),
        )
        .await
    }

    async fn issue_fresh(h: &Harness) -> AppResult<InvoiceRecord> {
        let preview = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 23))
            .await?;
        h.service.issue_invoice(preview.draft).await
    }

    /// Fingerprint the preview for `period()` currently shows.
    async fn shown_fingerprint(h: &Harness, gst_included: bool) -> String {
        h.service
            .prepare_draft(&period(), gst_included, date(2024, 8, 25))
            .await
            .unwrap()
            .draft
            .fingerprint()
    }

    #[tokio::test]
    async fn test_sequential_issuance_numbers_are_consecutive() {
        let h = week_harness(5).await;

        let mut numbers = Vec::new();
        for _ in 0..3 {
            numbers.push(issue_fresh(&h).await.unwrap().number);
        }

        assert_eq!(numbers, vec![5, 6, 7]);
        assert_eq!(h.counter.value(), 8);
        let history: Vec<u32> = h.invoices.snapshot().iter().map(|r| r.number).collect();
        assert_eq!(history, vec![7, 6, 5]);
    }

    #[tokio::test]
    async fn test_issued_record_matches_the_preview() {
        let h = week_harness(1).await;

        let preview = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 23))
            .await
            .unwrap();
        let expected = preview.draft.record().clone();
        let record = h.service.issue_invoice(preview.draft).await.unwrap();

        assert_eq!(record, expected);
        assert_eq!(record.state(), InvoiceState::Issued);
        assert_eq!(record.subtotal, 1912.5);
        assert!((record.total - 2103.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_empty_period_is_refused_without_consuming_a_number() {
        let h = harness(vec![entry(12, 8.0)], Some(profile()), 3, counting_renderer()).await;

        let result = issue_fresh(&h).await;

        assert!(matches!(
            result,
            Err(AppError::Precondition(Precondition::EmptyPeriod { .. }))
        ));
        assert_eq!(h.counter.value(), 3);
        assert!(h.invoices.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_missing_or_incomplete_profile_blocks_issuance() {
        let h = harness(vec![entry(19, 8.0)], None, 1, counting_renderer()).await;
        let preview = h
            .service
            .prepare_draft(&period(), false, date(2024, 8, 23))
            .await
            .unwrap();
        assert!(preview.profile.is_none());
        assert_eq!(preview.draft.record().items[0].rate, 0.0);
        assert!(matches!(
            h.service.issue_invoice(preview.draft).await,
            Err(AppError::Precondition(Precondition::ProfileIncomplete))
        ));

        let mut incomplete = profile();
        incomplete.abn = String::new();
        let h = harness(vec![entry(19, 8.0)], Some(incomplete), 1, counting_renderer()).await;
        assert!(matches!(
            issue_fresh(&h).await,
            Err(AppError::Precondition(Precondition::ProfileIncomplete))
        ));
        assert_eq!(h.counter.value(), 1);
    }

    #[tokio::test]
    async fn test_stale_draft_is_rejected() {
        let h = week_harness(1).await;

        let preview = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 23))
            .await
            .unwrap();
        let twin = preview.draft.clone();
        h.service.issue_invoice(preview.draft).await.unwrap();

        let result = h.service.issue_invoice(twin).await;

        assert!(matches!(
            result,
            Err(AppError::Precondition(Precondition::StaleDraft { draft: 1, current: 2 }))
        ));
        assert_eq!(h.invoices.snapshot().len(), 1);
        assert_eq!(h.counter.value(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_issuance_is_rejected() {
        let h = week_harness(1).await;
        let preview = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 23))
            .await
            .unwrap();

        let _held = h.service.issuance.lock().await;
        let result = h.service.issue_invoice(preview.draft).await;

        assert!(matches!(
            result,
            Err(AppError::Precondition(Precondition::IssuanceInProgress))
        ));
        assert!(h.invoices.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_history_write_failure_leaves_counter_unchanged() {
        let h = week_harness(4).await;
        h.invoices.fail_writes.store(true, Ordering::SeqCst);

        let result = issue_fresh(&h).await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert_eq!(h.counter.value(), 4);
        assert!(h.invoices.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_counter_write_failure_does_not_reuse_the_number() {
        let h = week_harness(1).await;
        h.counter.fail_writes.store(true, Ordering::SeqCst);

        let first = issue_fresh(&h).await.unwrap();
        assert_eq!(h.counter.value(), 1);

        h.counter.fail_writes.store(false, Ordering::SeqCst);
        let second = issue_fresh(&h).await.unwrap();

        assert_eq!(first.number, 1);
        assert_eq!(second.number, 2);
        assert_eq!(h.counter.value(), 3);
    }

    #[tokio::test]
    async fn test_materialization_is_idempotent() {
        let mut renderer = MockDocumentRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_, name| Ok(format!("/docs/{name}.html")));
        let h = harness(vec![entry(19, 8.0)], Some(profile()), 1, renderer).await;

        let record = issue_fresh(&h).await.unwrap();
        let first = h
            .service
            .materialize_document(&profile(), record)
            .await
            .unwrap();
        let second = h
            .service
            .materialize_document(&profile(), first.clone())
            .await
            .unwrap();

        assert_eq!(first.document_uri.as_deref(), Some("/docs/invoice-1.html"));
        assert_eq!(second, first);
        assert_eq!(h.invoices.snapshot()[0].state(), InvoiceState::Materialized);
    }

    #[tokio::test]
    async fn test_regeneration_failure_keeps_previous_document() {
        let mut renderer = MockDocumentRenderer::new();
        let mut seq = mockall::Sequence::new();
        renderer
            .expect_render()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("/docs/first.html".to_string()));
        renderer
            .expect_render()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(anyhow::anyhow!("renderer crashed")));
        renderer
            .expect_render()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("/docs/second.html".to_string()));
        let h = harness(vec![entry(19, 8.0)], Some(profile()), 1, renderer).await;

        let record = issue_fresh(&h).await.unwrap();
        h.service
            .materialize_document(&profile(), record)
            .await
            .unwrap();

        let failed = h.service.regenerate_document(1).await;
        assert!(matches!(failed, Err(AppError::Materialization(_))));
        assert_eq!(
            h.invoices.snapshot()[0].document_uri.as_deref(),
            Some("/docs/first.html")
        );

        let regenerated = h.service.regenerate_document(1).await.unwrap();
        assert_eq!(regenerated.document_uri.as_deref(), Some("/docs/second.html"));
        assert_eq!(h.invoices.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_regenerating_unknown_invoice_is_not_found() {
        let h = week_harness(1).await;
        assert!(matches!(
            h.service.regenerate_document(42).await,
            Err(AppError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_share_materializes_then_hands_off() {
        let h = week_harness(1).await;
        issue_fresh(&h).await.unwrap();

        let mut surface = MockShareSurface::new();
        surface.expect_is_available().returning(|_| true);
        surface
            .expect_share()
            .withf(|handle| handle == "/docs/invoice-1.html")
            .times(1)
            .returning(|_| Ok(()));

        let shared = h.service.share_invoice(1, &surface).await.unwrap();

        assert_eq!(shared.state(), InvoiceState::Materialized);
    }

    #[tokio::test]
    async fn test_sharing_unavailable_keeps_the_document() {
        let h = week_harness(1).await;
        issue_fresh(&h).await.unwrap();

        let mut surface = MockShareSurface::new();
        surface.expect_is_available().returning(|_| false);
        surface.expect_share().never();

        let result = h.service.share_invoice(1, &surface).await;

        assert!(matches!(result, Err(AppError::SharingUnavailable)));
        assert_eq!(h.invoices.snapshot()[0].state(), InvoiceState::Materialized);
    }

    #[tokio::test]
    async fn test_generate_issues_and_materializes() {
        let h = week_harness(9).await;
        let fingerprint = shown_fingerprint(&h, false).await;

        let generated = h
            .service
            .generate_invoice(&period(), false, 9, &fingerprint, date(2024, 8, 25))
            .await
            .unwrap();

        assert!(generated.document_error.is_none());
        assert_eq!(generated.record.number, 9);
        assert_eq!(generated.record.gst_amount, 0.0);
        assert_eq!(generated.record.state(), InvoiceState::Materialized);
        assert_eq!(h.counter.value(), 10);
    }

    #[tokio::test]
    async fn test_generate_with_outdated_preview_number_is_stale() {
        let h = week_harness(9).await;
        let fingerprint = shown_fingerprint(&h, true).await;
        h.service
            .generate_invoice(&period(), true, 9, &fingerprint, date(2024, 8, 25))
            .await
            .unwrap();

        let again = h
            .service
            .generate_invoice(&period(), true, 9, &fingerprint, date(2024, 8, 25))
            .await;

        assert!(matches!(
            again,
            Err(AppError::Precondition(Precondition::StaleDraft { draft: 9, current: 10 }))
        ));
        assert_eq!(h.invoices.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_reports_document_failure_but_keeps_invoice() {
        let mut renderer = MockDocumentRenderer::new();
        renderer
            .expect_render()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        let h = harness(vec![entry(19, 8.0)], Some(profile()), 1, renderer).await;
        let fingerprint = shown_fingerprint(&h, true).await;

        let generated = h
            .service
            .generate_invoice(&period(), true, 1, &fingerprint, date(2024, 8, 25))
            .await
            .unwrap();

        assert!(matches!(
            generated.document_error,
            Some(AppError::Materialization(_))
        ));
        assert_eq!(generated.record.state(), InvoiceState::Issued);
        assert_eq!(h.counter.value(), 2);
    }

    #[tokio::test]
    async fn test_generate_refuses_when_the_log_changed_since_preview() {
        let h = week_harness(4).await;
        let fingerprint = shown_fingerprint(&h, true).await;

        h.work_logs.upsert(&entry(20, 10.0)).await.unwrap();
        let result = h
            .service
            .generate_invoice(&period(), true, 4, &fingerprint, date(2024, 8, 25))
            .await;

        assert!(matches!(
            result,
            Err(AppError::Precondition(Precondition::PreviewChanged))
        ));
        assert_eq!(h.counter.value(), 4);
        assert!(h.invoices.snapshot().is_empty());

        // A fresh preview of the edited log can be issued.
        let refreshed = shown_fingerprint(&h, true).await;
        assert_ne!(refreshed, fingerprint);
        let generated = h
            .service
            .generate_invoice(&period(), true, 4, &refreshed, date(2024, 8, 25))
            .await
            .unwrap();
        assert_eq!(generated.record.total_hours(), 24.5);
    }

    #[tokio::test]
    async fn test_gst_flag_changes_the_fingerprint() {
        let h = week_harness(1).await;

        assert_ne!(
            shown_fingerprint(&h, true).await,
            shown_fingerprint(&h, false).await
        );
        assert_eq!(
            shown_fingerprint(&h, true).await,
            shown_fingerprint(&h, true).await
        );
    }

    #[tokio::test]
    async fn test_regeneration_renders_stored_figures_after_log_edits() {
        let mut renderer = MockDocumentRenderer::new();
        renderer
            .expect_render()
            .withf(|markup, _| {
                markup.contains("$1,912.50")
                    && markup.contains("$2,103.75")
                    && markup.contains("Day 21")
                    && !markup.contains("$1,530.00")
            })
            .times(1)
            .returning(|_, name| Ok(format!("/docs/{name}.html")));
        let h = harness(
            vec![entry(19, 7.5), entry(20, 8.0), entry(21, 7.0)],
            Some(profile()),
            1,
            renderer,
        )
        .await;
        let issued = issue_fresh(&h).await.unwrap();

        // Change one day and drop another; the live week would now bill 18 hours.
        h.work_logs.upsert(&entry(19, 10.0)).await.unwrap();
        h.work_logs
            .delete(&DateKey::from(date(2024, 8, 21)))
            .await
            .unwrap();
        let live = h
            .service
            .prepare_draft(&period(), false, date(2024, 8, 25))
            .await
            .unwrap();
        assert_eq!(live.draft.record().subtotal, 1530.0);

        let regenerated = h.service.regenerate_document(1).await.unwrap();

        assert_eq!(regenerated.items, issued.items);
        assert_eq!(regenerated.subtotal, issued.subtotal);
        assert_eq!(regenerated.gst_amount, issued.gst_amount);
        assert_eq!(regenerated.total, issued.total);
        assert_eq!(h.invoices.snapshot()[0].total, issued.total);
    }

    #[tokio::test]
    async fn test_can_issue_needs_a_complete_profile_and_work() {
        let h = week_harness(1).await;
        let ready = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 25))
            .await
            .unwrap();
        assert!(ready.can_issue());

        let mut incomplete = profile();
        incomplete.email = "  ".to_string();
        let h = harness(vec![entry(19, 8.0)], Some(incomplete), 1, counting_renderer()).await;
        let preview = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 25))
            .await
            .unwrap();
        assert!(preview.profile.is_some());
        assert!(!preview.can_issue());

        let h = harness(vec![entry(12, 8.0)], Some(profile()), 1, counting_renderer()).await;
        let empty = h
            .service
            .prepare_draft(&period(), true, date(2024, 8, 25))
            .await
            .unwrap();
        assert!(!empty.can_issue());
    }

    /// Holds the next history load until released, so a write can be
    /// slipped in between another operation's load and save.
    #[derive(Default)]
    struct GatedInvoiceStore {
        inner: MemoryInvoiceStore,
        armed: AtomicBool,
        paused: Notify,
        resume: Notify,
    }

    #[async_trait::async_trait]
    impl InvoiceStore for GatedInvoiceStore {
        async fn load(&self) -> anyhow::Result<Vec<InvoiceRecord>> {
            let snapshot = self.inner.load().await?;
            if self.armed.swap(false, Ordering::SeqCst) {
                self.paused.notify_one();
                self.resume.notified().await;
            }
            Ok(snapshot)
        }

        async fn save(&self, invoices: &[InvoiceRecord]) -> anyhow::Result<()> {
            self.inner.save(invoices).await
        }
    }

    #[tokio::test]
    async fn test_regeneration_and_issuance_do_not_lose_history_writes() {
        let store = Arc::new(GatedInvoiceStore::default());
        let profiles = ProfileStore::new(Arc::new(MemoryConfidentialStore::default()));
        profiles.set(&profile()).await.unwrap();

        // Rendering arms the gate, so regeneration pauses on its history load.
        let gate = store.clone();
        let mut renderer = MockDocumentRenderer::new();
        renderer.expect_render().returning(move |_, name| {
            gate.armed.store(true, Ordering::SeqCst);
            Ok(format!("/docs/{name}.html"))
        });

        let service = InvoiceService::new(
            Arc::new(MemoryWorkLogStore::with_entries(vec![entry(19, 8.0)])),
            store.clone(),
            Arc::new(MemoryCounterStore::default()),
            profiles,
            Arc::new(renderer),
        );
        let service = &service;
        let issue = move || async move {
            let preview = service
                .prepare_draft(&period(), false, date(2024, 8, 23))
                .await
                .unwrap();
            service.issue_invoice(preview.draft).await
        };
        issue().await.unwrap();

        let (regenerated, issued) = tokio::join!(service.regenerate_document(1), async {
            store.paused.notified().await;
            let (issued, _) = tokio::join!(issue(), async {
                for _ in 0..10 {
                    tokio::task::yield_now().await;
                }
                store.resume.notify_one();
            });
            issued
        });

        assert!(regenerated.is_ok());
        assert_eq!(issued.unwrap().number, 2);
        let history = store.inner.snapshot();
        let numbers: Vec<u32> = history.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![2, 1]);
        assert_eq!(history[1].document_uri.as_deref(), Some("/docs/invoice-1.html"));
    }
}
