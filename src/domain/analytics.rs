//! Dashboard analytics: period resolution and the reduction over invoices.

use crate::models::{Invoice, InvoiceStatus, InvoiceType};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

/// Resolve a period keyword to the start instant of the window ending now.
///
/// Weekly is a rolling seven days; the calendar periods snap to the start of
/// the current month, quarter or year.
pub fn period_start(period: Period, now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let date = match period {
        Period::Weekly => return now - Duration::days(7),
        Period::Monthly => NaiveDate::from_ymd_opt(today.year(), today.month(), 1),
        Period::Quarterly => {
            let quarter_month = (today.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(today.year(), quarter_month, 1)
        }
        Period::Yearly => NaiveDate::from_ymd_opt(today.year(), 1, 1),
    };
    let date = date.unwrap_or(today);
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub total_invoices: u64,
    pub total_revenue: Decimal,
    pub collected_amount: Decimal,
    pub pending_amount: Decimal,
    pub paid_count: u64,
    pub pending_count: u64,
    pub overdue_count: u64,
    pub service_types: BTreeMap<String, u64>,
    pub monthly_data: BTreeMap<String, MonthlyBucket>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyBucket {
    pub revenue: Decimal,
    pub collected: Decimal,
    pub count: u64,
    pub paid: u64,
    pub pending: u64,
}

/// Reduce a set of invoices to the dashboard aggregate. Pure; the caller
/// decides which invoices fall inside the period.
pub fn reduce(invoices: &[Invoice]) -> DashboardAnalytics {
    let mut service_types: BTreeMap<String, u64> = InvoiceType::ALL
        .iter()
        .map(|ty| (ty.as_str().to_string(), 0))
        .collect();
    let mut monthly_data: BTreeMap<String, MonthlyBucket> = BTreeMap::new();

    let mut analytics = DashboardAnalytics {
        total_invoices: invoices.len() as u64,
        total_revenue: Decimal::ZERO,
        collected_amount: Decimal::ZERO,
        pending_amount: Decimal::ZERO,
        paid_count: 0,
        pending_count: 0,
        overdue_count: 0,
        service_types: BTreeMap::new(),
        monthly_data: BTreeMap::new(),
    };

    for invoice in invoices {
        analytics.total_revenue += invoice.total_amount;
        analytics.collected_amount += invoice.collected_amount;
        analytics.pending_amount += invoice.pending_amount;

        match invoice.status {
            InvoiceStatus::Paid => analytics.paid_count += 1,
            InvoiceStatus::Pending => analytics.pending_count += 1,
            InvoiceStatus::Overdue => analytics.overdue_count += 1,
        }

        *service_types
            .entry(invoice.invoice_type.as_str().to_string())
            .or_default() += 1;

        let month_key = invoice.invoice_date.format("%Y-%m").to_string();
        let bucket = monthly_data.entry(month_key).or_default();
        bucket.revenue += invoice.total_amount;
        bucket.collected += invoice.collected_amount;
        bucket.count += 1;
        if invoice.status == InvoiceStatus::Paid {
            bucket.paid += 1;
        } else {
            bucket.pending += 1;
        }
    }

    analytics.service_types = service_types;
    analytics.monthly_data = monthly_data;
    analytics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Invoice, InvoiceDraft, LineItem, PaymentType};

    fn invoice(
        ty: InvoiceType,
        payment_type: PaymentType,
        total: i64,
        pending: i64,
        date: &str,
    ) -> Invoice {
        let invoice_date = format!("{date}T00:00:00Z").parse::<DateTime<Utc>>().unwrap();
        let draft = InvoiceDraft {
            invoice_number: None,
            invoice_type: ty,
            client_name: "Acme".to_string(),
            client_phone: "9000000000".to_string(),
            client_email: String::new(),
            client_address: String::new(),
            payment_type,
            total_amount: Decimal::from(total),
            subtotal_amount: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
            items: vec![LineItem {
                description: "Service".to_string(),
                quantity: 1,
                rate: Decimal::from(total),
                pending_payment: Decimal::from(pending),
            }],
            invoice_date: Some(invoice_date),
            due_date: None,
            notes: String::new(),
        };
        let mut inv = Invoice::from_draft(draft, format!("{}-001", ty.as_str()), Utc::now());
        crate::domain::settlement::apply(&mut inv, Utc::now());
        inv
    }

    #[test]
    fn reduce_totals_and_buckets() {
        let invoices = vec![
            invoice(InvoiceType::Sa, PaymentType::FullPayment, 1000, 0, "2026-01-15"),
            invoice(InvoiceType::Shr, PaymentType::InitialPayment, 500, 200, "2026-01-20"),
            invoice(InvoiceType::Sa, PaymentType::FullPayment, 300, 0, "2026-02-02"),
        ];
        let analytics = reduce(&invoices);

        assert_eq!(analytics.total_invoices, 3);
        assert_eq!(analytics.total_revenue, Decimal::from(1800));
        assert_eq!(analytics.collected_amount, Decimal::from(1600));
        assert_eq!(analytics.pending_amount, Decimal::from(200));
        assert_eq!(analytics.paid_count, 2);
        assert_eq!(analytics.pending_count, 1);
        assert_eq!(analytics.overdue_count, 0);
        assert_eq!(analytics.service_types["SA"], 2);
        assert_eq!(analytics.service_types["SHR"], 1);
        assert_eq!(analytics.service_types["STS"], 0);

        let january = &analytics.monthly_data["2026-01"];
        assert_eq!(january.count, 2);
        assert_eq!(january.revenue, Decimal::from(1500));
        assert_eq!(january.collected, Decimal::from(1300));
        assert_eq!(january.paid, 1);
        assert_eq!(january.pending, 1);
        assert_eq!(analytics.monthly_data["2026-02"].count, 1);
    }

    #[test]
    fn reduce_of_nothing_is_all_zeroes() {
        let analytics = reduce(&[]);
        assert_eq!(analytics.total_invoices, 0);
        assert_eq!(analytics.total_revenue, Decimal::ZERO);
        assert!(analytics.monthly_data.is_empty());
        assert_eq!(analytics.service_types.len(), 4);
    }

    #[test]
    fn period_start_resolution() {
        let now = "2026-08-20T12:30:00Z".parse::<DateTime<Utc>>().unwrap();

        assert_eq!(
            period_start(Period::Weekly, now),
            "2026-08-13T12:30:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            period_start(Period::Monthly, now),
            "2026-08-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            period_start(Period::Quarterly, now),
            "2026-07-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert_eq!(
            period_start(Period::Yearly, now),
            "2026-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}
