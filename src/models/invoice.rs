//! Invoice document model.
//!
//! Field names are camelCase in BSON and on the wire, matching the document
//! shape the dashboard consumes. `collectedAmount`, `pendingAmount` and
//! `status` are derived; they are only ever written by the settlement
//! calculator in the repository's write path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice type: partitions the numbering sequence and categorizes the
/// invoice's business line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceType {
    #[serde(rename = "SA")]
    Sa,
    #[serde(rename = "SHR")]
    Shr,
    #[serde(rename = "STS")]
    Sts,
    #[serde(rename = "SDE")]
    Sde,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Sa => "SA",
            InvoiceType::Shr => "SHR",
            InvoiceType::Sts => "STS",
            InvoiceType::Sde => "SDE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SA" => Some(InvoiceType::Sa),
            "SHR" => Some(InvoiceType::Shr),
            "STS" => Some(InvoiceType::Sts),
            "SDE" => Some(InvoiceType::Sde),
            _ => None,
        }
    }

    pub const ALL: [InvoiceType; 4] = [
        InvoiceType::Sa,
        InvoiceType::Shr,
        InvoiceType::Sts,
        InvoiceType::Sde,
    ];
}

/// Payment mode. Full Payment means the entire `totalAmount` is collected
/// immediately; Initial Payment tracks collected vs. pending per line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentType {
    #[default]
    #[serde(rename = "Full Payment")]
    FullPayment,
    #[serde(rename = "Initial Payment")]
    InitialPayment,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::FullPayment => "Full Payment",
            PaymentType::InitialPayment => "Initial Payment",
        }
    }
}

/// Derived invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(InvoiceStatus::Pending),
            "Paid" => Some(InvoiceStatus::Paid),
            "Overdue" => Some(InvoiceStatus::Overdue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub rate: Decimal,
    #[serde(default)]
    pub pending_payment: Decimal,
}

fn default_quantity() -> u32 {
    1
}

impl LineItem {
    /// Line amount: rate times quantity.
    pub fn amount(&self) -> Decimal {
        self.rate * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    pub invoice_type: InvoiceType,
    pub client_name: String,
    pub client_phone: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_address: String,
    #[serde(default)]
    pub payment_type: PaymentType,
    pub total_amount: Decimal,
    // Pre-tax amount as submitted by the client; stored and echoed back
    // untouched so the preview's tax breakdown keeps working.
    #[serde(default)]
    pub subtotal_amount: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
    pub items: Vec<LineItem>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub invoice_date: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub collected_amount: Decimal,
    #[serde(default)]
    pub pending_amount: Decimal,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub pdf_url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Typed filter for listing invoices. Pages are 1-based.
#[derive(Debug, Clone, Default)]
pub struct InvoiceListFilter {
    pub status: Option<InvoiceStatus>,
    pub invoice_type: Option<InvoiceType>,
    pub search: Option<String>,
    pub start_date: Option<chrono::NaiveDate>,
    pub end_date: Option<chrono::NaiveDate>,
    pub page: u64,
    pub limit: i64,
}

/// Validated input for creating or replacing an invoice. Carries no derived
/// fields; those are computed when the repository persists.
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub invoice_number: Option<String>,
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
    pub invoice_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: String,
}

impl Invoice {
    /// Build an unsettled invoice from a draft. Derived fields are zeroed;
    /// the caller must run the settlement calculator before persisting.
    pub fn from_draft(draft: InvoiceDraft, invoice_number: String, now: DateTime<Utc>) -> Self {
        Self {
            invoice_number,
            invoice_type: draft.invoice_type,
            client_name: draft.client_name,
            client_phone: draft.client_phone,
            client_email: draft.client_email,
            client_address: draft.client_address,
            payment_type: draft.payment_type,
            total_amount: draft.total_amount,
            subtotal_amount: draft.subtotal_amount,
            tax_percentage: draft.tax_percentage,
            items: draft.items,
            invoice_date: draft.invoice_date.unwrap_or(now),
            due_date: draft.due_date,
            collected_amount: Decimal::ZERO,
            pending_amount: Decimal::ZERO,
            status: InvoiceStatus::Pending,
            notes: draft.notes,
            pdf_url: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Contractual value of the whole engagement: `totalAmount` for a full
    /// payment, the sum of line amounts otherwise. Display-only; not
    /// persisted.
    pub fn total_project_value(&self) -> Decimal {
        match self.payment_type {
            PaymentType::FullPayment => self.total_amount,
            PaymentType::InitialPayment => self.items.iter().map(LineItem::amount).sum(),
        }
    }
}

// BSON stores optional dates as native datetimes, not strings.
mod opt_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => bson::DateTime::from_chrono(*dt).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt.map(|dt| dt.to_chrono()))
    }
}
