//! Invoice repository: every write path runs the settlement calculator
//! exactly once before persisting, so readers always see consistent derived
//! fields.

use crate::domain::{analytics, numbering, settlement};
use crate::error::AppError;
use crate::models::{Invoice, InvoiceDraft, InvoiceListFilter, InvoiceStatus, InvoiceType};
use crate::services::MongoDb;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneOptions, FindOneAndReplaceOptions, FindOptions, ReturnDocument};
use rust_decimal::Decimal;

/// How many times create() regenerates an auto-assigned number after losing
/// the allocation race before giving up with a conflict.
const NUMBER_ALLOCATION_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct InvoiceRepository {
    db: MongoDb,
}

pub struct InvoicePage {
    pub invoices: Vec<Invoice>,
    pub total: u64,
    pub pages: u64,
}

impl InvoiceRepository {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: InvoiceListFilter) -> Result<InvoicePage, AppError> {
        let query = build_list_query(&filter);

        let total = self
            .db
            .invoices()
            .count_documents(query.clone(), None)
            .await?;

        let skip = page_skip(filter.page, filter.limit);
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(filter.limit)
            .build();

        let mut cursor = self.db.invoices().find(query, options).await?;
        let mut invoices = Vec::new();
        while let Some(invoice) = cursor.try_next().await? {
            invoices.push(invoice);
        }

        Ok(InvoicePage {
            invoices,
            total,
            pages: total.div_ceil(filter.limit as u64),
        })
    }

    pub async fn get(&self, invoice_number: &str) -> Result<Invoice, AppError> {
        self.db
            .invoices()
            .find_one(doc! { "invoiceNumber": invoice_number }, None)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))
    }

    /// Create an invoice. A missing invoice number is allocated from the
    /// type's sequence; the unique index backstops concurrent allocations and
    /// an auto-assigned number is regenerated on a lost race.
    pub async fn create(&self, draft: InvoiceDraft) -> Result<Invoice, AppError> {
        let auto_numbered = draft.invoice_number.is_none();
        let mut attempt = 0;

        loop {
            let invoice_number = match &draft.invoice_number {
                Some(number) => number.clone(),
                None => self.next_number(draft.invoice_type).await?,
            };

            let now = Utc::now();
            let mut invoice = Invoice::from_draft(draft.clone(), invoice_number, now);
            settlement::apply(&mut invoice, now);

            match self.db.invoices().insert_one(&invoice, None).await {
                Ok(_) => return Ok(invoice),
                Err(err) if is_duplicate_key(&err) => {
                    if !auto_numbered {
                        return Err(AppError::Conflict(anyhow::anyhow!(
                            "Invoice number {} already exists",
                            invoice.invoice_number
                        )));
                    }
                    attempt += 1;
                    if attempt >= NUMBER_ALLOCATION_ATTEMPTS {
                        return Err(AppError::Conflict(anyhow::anyhow!(
                            "Could not allocate a unique {} invoice number after {} attempts",
                            draft.invoice_type.as_str(),
                            attempt
                        )));
                    }
                    tracing::warn!(
                        invoice_number = %invoice.invoice_number,
                        attempt,
                        "Lost invoice number allocation race; regenerating"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Full replacement. Invoice number, type and creation time are
    /// immutable; derived fields are recomputed from the draft.
    pub async fn replace(
        &self,
        invoice_number: &str,
        draft: InvoiceDraft,
    ) -> Result<Invoice, AppError> {
        let existing = self.get(invoice_number).await?;

        let now = Utc::now();
        let mut invoice =
            Invoice::from_draft(draft, existing.invoice_number.clone(), existing.created_at);
        invoice.invoice_type = existing.invoice_type;
        invoice.pdf_url = existing.pdf_url;
        invoice.updated_at = now;
        settlement::apply(&mut invoice, now);

        self.persist_replacement(invoice).await
    }

    /// Manual reconciliation: force the paid state regardless of what the
    /// calculator would derive from the items. Idempotent.
    pub async fn mark_paid(&self, invoice_number: &str) -> Result<Invoice, AppError> {
        let mut invoice = self.get(invoice_number).await?;
        invoice.status = InvoiceStatus::Paid;
        invoice.collected_amount = invoice.total_amount;
        invoice.pending_amount = Decimal::ZERO;
        invoice.updated_at = Utc::now();

        self.persist_replacement(invoice).await
    }

    pub async fn delete(&self, invoice_number: &str) -> Result<(), AppError> {
        let deleted = self
            .db
            .invoices()
            .find_one_and_delete(doc! { "invoiceNumber": invoice_number }, None)
            .await?;
        if deleted.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
        }
        Ok(())
    }

    pub async fn set_pdf_url(&self, invoice_number: &str, url: &str) -> Result<(), AppError> {
        self.db
            .invoices()
            .update_one(
                doc! { "invoiceNumber": invoice_number },
                doc! { "$set": {
                    "pdfUrl": url,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                } },
                None,
            )
            .await?;
        Ok(())
    }

    /// Aggregate the dashboard analytics over all invoices dated inside the
    /// period.
    pub async fn dashboard(
        &self,
        period: analytics::Period,
    ) -> Result<analytics::DashboardAnalytics, AppError> {
        let start = analytics::period_start(period, Utc::now());

        let query = doc! {
            "invoiceDate": { "$gte": bson::DateTime::from_chrono(start) }
        };
        let mut cursor = self.db.invoices().find(query, None).await?;
        let mut invoices = Vec::new();
        while let Some(invoice) = cursor.try_next().await? {
            invoices.push(invoice);
        }

        Ok(analytics::reduce(&invoices))
    }

    async fn next_number(&self, invoice_type: InvoiceType) -> Result<String, AppError> {
        // _id breaks ties between invoices created in the same millisecond.
        let options = FindOneOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();
        let latest = self
            .db
            .invoices()
            .find_one(doc! { "invoiceType": invoice_type.as_str() }, options)
            .await?;

        numbering::next_invoice_number(invoice_type, latest.as_ref().map(|i| i.invoice_number.as_str()))
    }

    async fn persist_replacement(&self, invoice: Invoice) -> Result<Invoice, AppError> {
        let options = FindOneAndReplaceOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.db
            .invoices()
            .find_one_and_replace(
                doc! { "invoiceNumber": &invoice.invoice_number },
                &invoice,
                options,
            )
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))
    }
}

fn build_list_query(filter: &InvoiceListFilter) -> Document {
    let mut query = Document::new();

    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(invoice_type) = filter.invoice_type {
        query.insert("invoiceType", invoice_type.as_str());
    }
    if let Some(search) = &filter.search {
        let pattern = escape_regex(search);
        let matcher = |field: &str| {
            doc! { field: { "$regex": pattern.clone(), "$options": "i" } }
        };
        query.insert(
            "$or",
            vec![
                matcher("clientName"),
                matcher("invoiceNumber"),
                matcher("clientPhone"),
            ],
        );
    }

    let mut date_range = Document::new();
    if let Some(start) = filter.start_date {
        date_range.insert("$gte", bson::DateTime::from_chrono(start_of_day(start)));
    }
    if let Some(end) = filter.end_date {
        // Inclusive end date: strictly before the next day's midnight.
        let next_day = end.succ_opt().unwrap_or(end);
        date_range.insert("$lt", bson::DateTime::from_chrono(start_of_day(next_day)));
    }
    if !date_range.is_empty() {
        query.insert("invoiceDate", date_range);
    }

    query
}

// Pages are 1-based; treat anything below that as the first page.
fn page_skip(page: u64, limit: i64) -> u64 {
    page.max(1).saturating_sub(1) * limit as u64
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if r"\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_err)) if write_err.code == 11000
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_regex_neutralizes_metacharacters() {
        assert_eq!(escape_regex("SA-001"), "SA-001");
        assert_eq!(escape_regex("a.b*c"), "a\\.b\\*c");
        assert_eq!(escape_regex("plain text"), "plain text");
    }

    #[test]
    fn list_query_composes_filters() {
        let filter = InvoiceListFilter {
            status: Some(InvoiceStatus::Overdue),
            invoice_type: Some(InvoiceType::Shr),
            search: Some("acme".to_string()),
            start_date: "2026-01-01".parse().ok(),
            end_date: "2026-01-31".parse().ok(),
            page: 1,
            limit: 10,
        };
        let query = build_list_query(&filter);

        assert_eq!(query.get_str("status").unwrap(), "Overdue");
        assert_eq!(query.get_str("invoiceType").unwrap(), "SHR");
        assert_eq!(query.get_array("$or").unwrap().len(), 3);
        let range = query.get_document("invoiceDate").unwrap();
        assert!(range.contains_key("$gte"));
        assert!(range.contains_key("$lt"));
    }

    #[test]
    fn page_skip_treats_page_zero_as_the_first_page() {
        assert_eq!(page_skip(0, 10), 0);
        assert_eq!(page_skip(1, 10), 0);
        assert_eq!(page_skip(3, 10), 20);
    }

    #[test]
    fn empty_filter_builds_an_empty_query() {
        let query = build_list_query(&InvoiceListFilter {
            page: 1,
            limit: 10,
            ..Default::default()
        });
        assert!(query.is_empty());
    }
}
