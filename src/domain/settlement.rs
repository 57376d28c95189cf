//! Settlement calculator: derives collected/pending amounts and status.
//!
//! This is the one place those fields are computed. The repository applies it
//! on every create and replace; readers (list, get, the PDF renderer) consume
//! the persisted result instead of re-deriving from raw items.

use crate::models::{Invoice, InvoiceStatus, LineItem, PaymentType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub collected_amount: Decimal,
    pub pending_amount: Decimal,
    pub total_project_value: Decimal,
    pub status: InvoiceStatus,
}

/// Compute the derived amounts and status for an invoice.
///
/// Full payment collects the entire total immediately and is always Paid.
/// Initial payment collects line amounts minus the pending portions; an
/// exactly-zero pending balance is Paid (terminal), a due date strictly in
/// the past makes it Overdue, and a due date equal to `now` is not yet
/// overdue.
pub fn settle(
    payment_type: PaymentType,
    total_amount: Decimal,
    items: &[LineItem],
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Settlement {
    match payment_type {
        PaymentType::FullPayment => Settlement {
            collected_amount: total_amount,
            pending_amount: Decimal::ZERO,
            total_project_value: total_amount,
            status: InvoiceStatus::Paid,
        },
        PaymentType::InitialPayment => {
            let item_total: Decimal = items.iter().map(LineItem::amount).sum();
            let pending: Decimal = items.iter().map(|item| item.pending_payment).sum();

            let status = if pending <= Decimal::ZERO {
                InvoiceStatus::Paid
            } else if due_date.is_some_and(|due| due < now) {
                InvoiceStatus::Overdue
            } else {
                InvoiceStatus::Pending
            };

            Settlement {
                collected_amount: item_total - pending,
                pending_amount: pending,
                total_project_value: item_total,
                status,
            }
        }
    }
}

/// Write the derived fields onto an invoice in place.
pub fn apply(invoice: &mut Invoice, now: DateTime<Utc>) {
    let settlement = settle(
        invoice.payment_type,
        invoice.total_amount,
        &invoice.items,
        invoice.due_date,
        now,
    );
    invoice.collected_amount = settlement.collected_amount;
    invoice.pending_amount = settlement.pending_amount;
    invoice.status = settlement.status;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(rate: i64, pending: i64) -> LineItem {
        LineItem {
            description: "Service".to_string(),
            quantity: 1,
            rate: Decimal::from(rate),
            pending_payment: Decimal::from(pending),
        }
    }

    #[test]
    fn full_payment_is_always_paid_in_full() {
        let settlement = settle(
            PaymentType::FullPayment,
            Decimal::from(1000),
            &[item(400, 300)],
            None,
            Utc::now(),
        );
        assert_eq!(settlement.collected_amount, Decimal::from(1000));
        assert_eq!(settlement.pending_amount, Decimal::ZERO);
        assert_eq!(settlement.total_project_value, Decimal::from(1000));
        assert_eq!(settlement.status, InvoiceStatus::Paid);
    }

    #[test]
    fn initial_payment_with_future_due_date_is_pending() {
        let now = Utc::now();
        let settlement = settle(
            PaymentType::InitialPayment,
            Decimal::from(1000),
            &[item(1000, 400)],
            Some(now + Duration::days(1)),
            now,
        );
        assert_eq!(settlement.collected_amount, Decimal::from(600));
        assert_eq!(settlement.pending_amount, Decimal::from(400));
        assert_eq!(settlement.status, InvoiceStatus::Pending);
    }

    #[test]
    fn initial_payment_past_due_date_is_overdue() {
        let now = Utc::now();
        let settlement = settle(
            PaymentType::InitialPayment,
            Decimal::from(1000),
            &[item(1000, 400)],
            Some(now - Duration::days(1)),
            now,
        );
        assert_eq!(settlement.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn zero_pending_is_paid_even_when_overdue() {
        let now = Utc::now();
        let settlement = settle(
            PaymentType::InitialPayment,
            Decimal::from(1000),
            &[item(1000, 0)],
            Some(now - Duration::days(30)),
            now,
        );
        assert_eq!(settlement.collected_amount, Decimal::from(1000));
        assert_eq!(settlement.pending_amount, Decimal::ZERO);
        assert_eq!(settlement.status, InvoiceStatus::Paid);
    }

    #[test]
    fn due_date_equal_to_now_is_not_yet_overdue() {
        let now = Utc::now();
        let settlement = settle(
            PaymentType::InitialPayment,
            Decimal::from(1000),
            &[item(1000, 400)],
            Some(now),
            now,
        );
        assert_eq!(settlement.status, InvoiceStatus::Pending);
    }

    #[test]
    fn missing_due_date_never_goes_overdue() {
        let settlement = settle(
            PaymentType::InitialPayment,
            Decimal::from(1000),
            &[item(1000, 400)],
            None,
            Utc::now(),
        );
        assert_eq!(settlement.status, InvoiceStatus::Pending);
    }

    #[test]
    fn quantity_participates_in_collected_amount() {
        let line = LineItem {
            description: "Hosting".to_string(),
            quantity: 3,
            rate: Decimal::from(200),
            pending_payment: Decimal::from(100),
        };
        let settlement = settle(
            PaymentType::InitialPayment,
            Decimal::from(600),
            &[line],
            None,
            Utc::now(),
        );
        assert_eq!(settlement.total_project_value, Decimal::from(600));
        assert_eq!(settlement.collected_amount, Decimal::from(500));
        assert_eq!(settlement.pending_amount, Decimal::from(100));
    }

    #[test]
    fn apply_writes_derived_fields_onto_the_invoice() {
        use crate::models::{Invoice, InvoiceDraft, InvoiceType};
        let draft = InvoiceDraft {
            invoice_number: None,
            invoice_type: InvoiceType::Shr,
            client_name: "Acme".to_string(),
            client_phone: "9000000000".to_string(),
            client_email: String::new(),
            client_address: String::new(),
            payment_type: PaymentType::InitialPayment,
            total_amount: Decimal::from(1000),
            subtotal_amount: Decimal::ZERO,
            tax_percentage: Decimal::ZERO,
            items: vec![item(1000, 400)],
            invoice_date: None,
            due_date: Some(Utc::now() + Duration::days(1)),
            notes: String::new(),
        };
        let mut invoice = Invoice::from_draft(draft, "SHR-001".to_string(), Utc::now());
        apply(&mut invoice, Utc::now());
        assert_eq!(invoice.collected_amount, Decimal::from(600));
        assert_eq!(invoice.pending_amount, Decimal::from(400));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
    }
}
