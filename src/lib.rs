//! invoice-service: REST backend for invoice management.
//!
//! Invoices are persisted in MongoDB. The collected/pending amounts and the
//! invoice status are derived fields, computed by a single pure settlement
//! calculator in the repository's write path; invoice numbers are allocated
//! per type from a sequential counter backed by a unique index. PDF rendering
//! goes through a headless browser and is treated as an external dependency
//! that may fail without failing the owning request.

pub mod config;
pub mod domain;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;
