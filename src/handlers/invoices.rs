use crate::dtos::{
    AnalyticsQuery, ApiResponse, CreateInvoiceRequest, InvoiceResponse, ListInvoicesQuery,
    Pagination,
};
use crate::error::AppError;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = query.into_filter()?;
    let page_number = filter.page;
    let page = state.repository.list(filter).await?;

    let invoices: Vec<InvoiceResponse> = page
        .invoices
        .into_iter()
        .map(InvoiceResponse::from)
        .collect();

    Ok(Json(ApiResponse::paginated(
        invoices,
        Pagination {
            page: page_number,
            pages: page.pages,
            total: page.total,
        },
    )))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.repository.get(&invoice_number).await?;
    Ok(Json(ApiResponse::data(InvoiceResponse::from(invoice))))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut invoice = state.repository.create(payload.into_draft()).await?;
    metrics::counter!("invoices_created_total", "invoice_type" => invoice.invoice_type.as_str())
        .increment(1);

    // PDF rendering must not fail the create; the invoice stands on its own
    // and the PDF endpoint re-renders on demand.
    match state.pdf.render(&invoice).await {
        Ok(_) => {
            let url = format!("/api/invoices/{}/pdf", invoice.invoice_number);
            match state
                .repository
                .set_pdf_url(&invoice.invoice_number, &url)
                .await
            {
                Ok(()) => invoice.pdf_url = url,
                Err(e) => {
                    tracing::warn!(
                        invoice_number = %invoice.invoice_number,
                        error = %e,
                        "Failed to record PDF reference; invoice created without it"
                    );
                }
            }
        }
        Err(e) => {
            tracing::warn!(
                invoice_number = %invoice.invoice_number,
                error = %e,
                "PDF generation failed; invoice created without a cached PDF reference"
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            InvoiceResponse::from(invoice),
            "Invoice created successfully",
        )),
    ))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invoice = state
        .repository
        .replace(&invoice_number, payload.into_draft())
        .await?;

    Ok(Json(ApiResponse::with_message(
        InvoiceResponse::from(invoice),
        "Invoice updated successfully",
    )))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.repository.mark_paid(&invoice_number).await?;
    Ok(Json(ApiResponse::with_message(
        InvoiceResponse::from(invoice),
        "Invoice marked as paid successfully",
    )))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.repository.delete(&invoice_number).await?;
    Ok(Json(ApiResponse::message("Invoice deleted successfully")))
}

pub async fn dashboard_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let analytics = state.repository.dashboard(query.period).await?;
    Ok(Json(ApiResponse::data(analytics)))
}

pub async fn download_pdf(
    State(state): State<AppState>,
    Path(invoice_number): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.repository.get(&invoice_number).await?;
    let bytes = state.pdf.render(&invoice).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", invoice.invoice_number),
            ),
        ],
        bytes,
    ))
}
