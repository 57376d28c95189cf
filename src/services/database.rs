use crate::config::MongoConfig;
use crate::error::AppError;
use crate::models::Invoice;
use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use std::time::Duration;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!(uri = %config.uri, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB URI {}: {}", config.uri, e);
            AppError::from(e)
        })?;
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_secs));
        options.max_pool_size = Some(10);

        let client = MongoClient::with_options(options).map_err(AppError::from)?;
        let db = client.database(&config.database);
        tracing::info!(database = %config.database, "MongoDB client ready");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for invoice-service");

        let invoices = self.invoices();

        // Unique index on invoiceNumber: the backstop for the numbering race.
        // A lost read-then-increment race surfaces as a duplicate-key error
        // instead of a silent overwrite.
        let number_index = IndexModel::builder()
            .keys(doc! { "invoiceNumber": 1 })
            .options(
                IndexOptions::builder()
                    .name("invoice_number_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        invoices.create_index(number_index, None).await.map_err(|e| {
            tracing::error!("Failed to create invoiceNumber index: {}", e);
            AppError::from(e)
        })?;

        // (invoiceType, createdAt desc) serves the latest-number lookup.
        let type_created_index = IndexModel::builder()
            .keys(doc! { "invoiceType": 1, "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("type_created_lookup".to_string())
                    .build(),
            )
            .build();
        invoices
            .create_index(type_created_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create (invoiceType, createdAt) index: {}", e);
                AppError::from(e)
            })?;

        // (status, invoiceDate) serves list filtering and analytics scans.
        let status_date_index = IndexModel::builder()
            .keys(doc! { "status": 1, "invoiceDate": -1 })
            .options(
                IndexOptions::builder()
                    .name("status_date_lookup".to_string())
                    .build(),
            )
            .build();
        invoices
            .create_index(status_date_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create (status, invoiceDate) index: {}", e);
                AppError::from(e)
            })?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection("invoices")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
