pub mod health;
pub mod invoices;

pub use health::{health_check, metrics_endpoint};
pub use invoices::{
    create_invoice, dashboard_analytics, delete_invoice, download_pdf, get_invoice, list_invoices,
    mark_paid, update_invoice,
};
