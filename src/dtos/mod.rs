pub mod envelope;
pub mod invoices;

pub use envelope::{ApiResponse, Pagination};
pub use invoices::{
    AnalyticsQuery, CreateInvoiceRequest, InvoiceResponse, LineItemRequest, ListInvoicesQuery,
};
