//! Typed request/response structs for the invoice endpoints. Filters and
//! form payloads are enumerated fields, not open-ended bags; derived fields
//! never appear on the request side.

use crate::error::AppError;
use crate::models::{
    Invoice, InvoiceDraft, InvoiceListFilter, InvoiceStatus, InvoiceType, LineItem, PaymentType,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub invoice_number: Option<String>,
    pub invoice_type: InvoiceType,

    #[validate(length(min = 1, message = "Client name is required"))]
    pub client_name: String,

    #[validate(length(min = 1, message = "Client phone is required"))]
    pub client_phone: String,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(email(message = "Invalid client email"))]
    pub client_email: Option<String>,

    pub client_address: Option<String>,

    #[serde(default)]
    pub payment_type: PaymentType,

    #[validate(custom(function = validate_non_negative))]
    pub total_amount: Decimal,

    #[serde(default)]
    #[validate(custom(function = validate_non_negative))]
    pub subtotal_amount: Decimal,

    #[serde(default)]
    #[validate(custom(function = validate_percentage))]
    pub tax_percentage: Decimal,

    #[validate(length(min = 1, message = "At least one line item is required"), nested)]
    pub items: Vec<LineItemRequest>,

    #[serde(default, deserialize_with = "flexible_datetime::deserialize")]
    pub invoice_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "flexible_datetime::deserialize")]
    pub due_date: Option<DateTime<Utc>>,

    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_line_item))]
pub struct LineItemRequest {
    #[validate(length(min = 1, message = "Item description is required"))]
    pub description: String,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,

    #[validate(custom(function = validate_non_negative))]
    pub rate: Decimal,

    #[serde(default)]
    #[validate(custom(function = validate_non_negative))]
    pub pending_payment: Decimal,
}

fn default_quantity() -> u32 {
    1
}

// The dashboard submits cleared optional inputs as empty strings.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.filter(|s| !s.is_empty()))
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Amount cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::from(100) {
        let mut err = ValidationError::new("percentage");
        err.message = Some("Tax percentage must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

// A pending portion above the line amount would mean a negative paid amount
// for the item; rejected here rather than silently carried through.
fn validate_line_item(item: &LineItemRequest) -> Result<(), ValidationError> {
    if item.pending_payment > item.rate * Decimal::from(item.quantity) {
        let mut err = ValidationError::new("pending_exceeds_amount");
        err.message = Some("Pending payment cannot exceed the line amount".into());
        return Err(err);
    }
    Ok(())
}

impl CreateInvoiceRequest {
    pub fn into_draft(self) -> InvoiceDraft {
        InvoiceDraft {
            invoice_number: self.invoice_number.filter(|n| !n.is_empty()),
            invoice_type: self.invoice_type,
            client_name: self.client_name,
            client_phone: self.client_phone,
            client_email: self.client_email.unwrap_or_default(),
            client_address: self.client_address.unwrap_or_default(),
            payment_type: self.payment_type,
            total_amount: self.total_amount,
            subtotal_amount: self.subtotal_amount,
            tax_percentage: self.tax_percentage,
            items: self
                .items
                .into_iter()
                .map(|item| LineItem {
                    description: item.description,
                    quantity: item.quantity,
                    rate: item.rate,
                    pending_payment: item.pending_payment,
                })
                .collect(),
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            notes: self.notes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    pub page: Option<u64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub invoice_type: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListInvoicesQuery {
    /// Turn the raw query into a typed filter. `all` is the UI's sentinel for
    /// "no filter"; anything else unrecognized is rejected.
    pub fn into_filter(self) -> Result<InvoiceListFilter, AppError> {
        let status = match self.status.as_deref() {
            None | Some("all") | Some("") => None,
            Some(s) => Some(InvoiceStatus::parse(s).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("unknown status filter: {s}"))
            })?),
        };
        let invoice_type = match self.invoice_type.as_deref() {
            None | Some("all") | Some("") => None,
            Some(s) => Some(InvoiceType::parse(s).ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!("unknown invoice type filter: {s}"))
            })?),
        };

        Ok(InvoiceListFilter {
            status,
            invoice_type,
            search: self.search.filter(|s| !s.is_empty()),
            start_date: self.start_date,
            end_date: self.end_date,
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(10).clamp(1, 100),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub period: crate::domain::analytics::Period,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub invoice_number: String,
    pub invoice_type: InvoiceType,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub client_address: String,
    pub payment_type: PaymentType,
    pub total_amount: Decimal,
    pub subtotal_amount: Decimal,
    pub tax_percentage: Decimal,
    pub items: Vec<LineItem>,
    pub invoice_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub collected_amount: Decimal,
    pub pending_amount: Decimal,
    pub status: InvoiceStatus,
    pub notes: String,
    pub pdf_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_number: invoice.invoice_number,
            invoice_type: invoice.invoice_type,
            client_name: invoice.client_name,
            client_phone: invoice.client_phone,
            client_email: invoice.client_email,
            client_address: invoice.client_address,
            payment_type: invoice.payment_type,
            total_amount: invoice.total_amount,
            subtotal_amount: invoice.subtotal_amount,
            tax_percentage: invoice.tax_percentage,
            items: invoice.items,
            invoice_date: invoice.invoice_date.to_rfc3339(),
            due_date: invoice.due_date.map(|d| d.to_rfc3339()),
            collected_amount: invoice.collected_amount,
            pending_amount: invoice.pending_amount,
            status: invoice.status,
            notes: invoice.notes,
            pdf_url: invoice.pdf_url,
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

/// Accepts either an RFC 3339 datetime or a bare `YYYY-MM-DD` date, which is
/// what the dashboard's date inputs submit.
mod flexible_datetime {
    use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map(Some).map_err(serde::de::Error::custom),
        }
    }

    fn parse(s: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
        Err(format!("unrecognized date value: {s:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_request() -> serde_json::Value {
        json!({
            "invoiceType": "SA",
            "clientName": "Acme Traders",
            "clientPhone": "9000000000",
            "paymentType": "Full Payment",
            "totalAmount": 1000,
            "items": [{ "description": "Website build", "rate": 1000 }]
        })
    }

    #[test]
    fn minimal_request_validates_with_defaults() {
        let req: CreateInvoiceRequest = serde_json::from_value(valid_request()).unwrap();
        req.validate().unwrap();
        assert_eq!(req.items[0].quantity, 1);
        assert_eq!(req.items[0].pending_payment, Decimal::ZERO);
        assert_eq!(req.tax_percentage, Decimal::ZERO);
    }

    #[test]
    fn cleared_email_input_passes_validation() {
        let mut body = valid_request();
        body["clientEmail"] = json!("");
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        req.validate().unwrap();
        assert!(req.client_email.is_none());

        let mut body = valid_request();
        body["clientEmail"] = json!("not-an-email");
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_client_name_is_rejected() {
        let mut body = valid_request();
        body["clientName"] = json!("");
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_items_are_rejected() {
        let mut body = valid_request();
        body["items"] = json!([]);
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn pending_payment_above_line_amount_is_rejected() {
        let mut body = valid_request();
        body["items"] = json!([{ "description": "Hosting", "rate": 100, "pendingPayment": 150 }]);
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn pending_payment_within_quantity_scaled_amount_is_accepted() {
        let mut body = valid_request();
        body["items"] =
            json!([{ "description": "Hosting", "rate": 100, "quantity": 2, "pendingPayment": 150 }]);
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        req.validate().unwrap();
    }

    #[test]
    fn subtotal_amount_is_carried_through_unchanged() {
        let mut body = valid_request();
        body["subtotalAmount"] = json!(900);
        body["taxPercentage"] = json!(10);
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        req.validate().unwrap();
        assert_eq!(req.into_draft().subtotal_amount, Decimal::from(900));

        let mut body = valid_request();
        body["subtotalAmount"] = json!(-1);
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn tax_percentage_out_of_range_is_rejected() {
        let mut body = valid_request();
        body["taxPercentage"] = json!(120);
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn due_date_accepts_bare_dates() {
        let mut body = valid_request();
        body["dueDate"] = json!("2026-09-01");
        let req: CreateInvoiceRequest = serde_json::from_value(body).unwrap();
        assert_eq!(
            req.due_date.unwrap(),
            "2026-09-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn list_query_all_sentinel_means_no_filter() {
        let query = ListInvoicesQuery {
            status: Some("all".to_string()),
            invoice_type: Some("SHR".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter().unwrap();
        assert!(filter.status.is_none());
        assert_eq!(filter.invoice_type, Some(InvoiceType::Shr));
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, 10);
    }

    #[test]
    fn list_query_rejects_unknown_status() {
        let query = ListInvoicesQuery {
            status: Some("Settled".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().is_err());
    }
}
