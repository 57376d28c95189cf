pub mod database;
pub mod metrics;
pub mod pdf;
pub mod repository;

pub use database::MongoDb;
pub use metrics::{get_metrics, init_metrics};
pub use pdf::{ChromiumRenderer, PdfRenderer};
pub use repository::InvoiceRepository;
