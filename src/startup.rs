use crate::config::AppConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::{ChromiumRenderer, InvoiceRepository, MongoDb, PdfRenderer};
use axum::{
    routing::{get, patch},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: MongoDb,
    pub repository: InvoiceRepository,
    pub pdf: Arc<dyn PdfRenderer>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: AppConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            e
        })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let repository = InvoiceRepository::new(db.clone());
        let pdf: Arc<dyn PdfRenderer> = Arc::new(ChromiumRenderer::new(&config.pdf)?);

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
            repository,
            pdf,
        };

        let app = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route(
                "/api/invoices",
                get(handlers::list_invoices).post(handlers::create_invoice),
            )
            .route(
                "/api/invoices/analytics/dashboard",
                get(handlers::dashboard_analytics),
            )
            .route(
                "/api/invoices/:invoice_number",
                get(handlers::get_invoice)
                    .put(handlers::update_invoice)
                    .delete(handlers::delete_invoice),
            )
            .route(
                "/api/invoices/:invoice_number/mark-paid",
                patch(handlers::mark_paid),
            )
            .route(
                "/api/invoices/:invoice_number/pdf",
                get(handlers::download_pdf),
            )
            .route("/metrics", get(handlers::metrics_endpoint))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
