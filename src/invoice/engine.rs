use crate::database::models::{GST_RATE, InvoiceDraft, InvoiceLineItem, InvoiceRecord, WorkLogEntry};
use crate::utils::time::{DateKey, end_of_week, start_of_week};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Inclusive Monday..Sunday billing window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: DateKey,
    pub end: DateKey,
}

impl BillingPeriod {
    pub fn week_of(date: NaiveDate) -> Self {
        Self {
            start: DateKey::from(start_of_week(date).date()),
            end: DateKey::from(end_of_week(date).date()),
        }
    }

    pub fn contains(&self, date: &DateKey) -> bool {
        &self.start <= date && date <= &self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub gst_amount: f64,
    pub total: f64,
}

/// One line item per entry inside `period`, ascending by date, all at `rate`.
pub fn build_line_items(
    entries: &BTreeMap<DateKey, WorkLogEntry>,
    period: &BillingPeriod,
    rate: f64,
) -> Vec<InvoiceLineItem> {
    let mut items: Vec<InvoiceLineItem> = entries
        .values()
        .filter(|entry| period.contains(&entry.date))
        .map(|entry| InvoiceLineItem {
            date: entry.date.clone(),
            description: entry.description.clone(),
            hours: entry.hours,
            rate,
            line_total: entry.hours * rate,
        })
        .collect();

    // The map is already ordered, but callers may key entries loosely.
    items.sort_by(|a, b| a.date.cmp(&b.date));
    items
}

/// Unrounded totals; rounding happens only when a figure is formatted.
pub fn compute_totals(items: &[InvoiceLineItem], gst_included: bool) -> Totals {
    let subtotal: f64 = items.iter().map(|item| item.line_total).sum();
    let gst_amount = if gst_included { subtotal * GST_RATE } else { 0.0 };

    Totals {
        subtotal,
        gst_amount,
        total: subtotal + gst_amount,
    }
}

pub fn preview_invoice(
    entries: &BTreeMap<DateKey, WorkLogEntry>,
    period: &BillingPeriod,
    rate: f64,
    gst_included: bool,
    number: u32,
    issue_date: NaiveDate,
) -> InvoiceDraft {
    let items = build_line_items(entries, period, rate);
    let totals = compute_totals(&items, gst_included);

    InvoiceDraft::new(InvoiceRecord {
        number,
        issue_date: DateKey::from(issue_date),
        period_start: period.start.clone(),
        period_end: period.end.clone(),
        items,
        subtotal: totals.subtotal,
        gst_included,
        gst_amount: totals.gst_amount,
        total: totals.total,
        document_uri: None,
    })
}
