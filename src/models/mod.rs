pub mod invoice;

pub use invoice::{
    Invoice, InvoiceDraft, InvoiceListFilter, InvoiceStatus, InvoiceType, LineItem, PaymentType,
};
