//! PDF rendering: an external collaborator behind the `PdfRenderer` seam.
//!
//! The Chromium implementation builds an HTML snapshot of the invoice —
//! derived fields are read from the persisted record, never recomputed — and
//! drives a headless `--print-to-pdf` run with an explicit timeout. Remote
//! brand assets (logo, signature) are fetched with their own timeout and fall
//! back to a locally synthesized placeholder; that path degrades, it never
//! fails.

use crate::config::PdfConfig;
use crate::error::AppError;
use crate::models::{Invoice, PaymentType};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use uuid::Uuid;

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, AppError>;
}

pub struct ChromiumRenderer {
    browser_path: String,
    render_timeout: Duration,
    assets: AssetFetcher,
}

impl ChromiumRenderer {
    pub fn new(config: &PdfConfig) -> Result<Self, AppError> {
        Ok(Self {
            browser_path: config.browser_path.clone(),
            render_timeout: Duration::from_secs(config.render_timeout_secs),
            assets: AssetFetcher::new(config)?,
        })
    }

    async fn print_to_pdf(&self, html_path: &Path, pdf_path: &Path) -> Result<(), AppError> {
        let pdf_arg = format!("--print-to-pdf={}", pdf_path.display());
        let html_arg = html_path.display().to_string();

        let mut cmd = Command::new(&self.browser_path);
        cmd.args([
            "--headless=new",
            "--no-sandbox",
            "--disable-gpu",
            "--no-pdf-header-footer",
            &pdf_arg,
            &html_arg,
        ]);
        cmd.stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        tracing::debug!(
            browser = %self.browser_path,
            timeout_secs = self.render_timeout.as_secs(),
            "Rendering invoice PDF"
        );

        let output = tokio::time::timeout(self.render_timeout, cmd.output())
            .await
            .map_err(|_| {
                AppError::Dependency(anyhow::anyhow!(
                    "PDF render timed out after {} seconds",
                    self.render_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::Dependency(anyhow::anyhow!(
                    "failed to launch {}: {}",
                    self.browser_path,
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(browser = %self.browser_path, stderr = %stderr, "PDF render failed");
            return Err(AppError::Dependency(anyhow::anyhow!(
                "PDF render failed: {}",
                stderr
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render(&self, invoice: &Invoice) -> Result<Vec<u8>, AppError> {
        let assets = self.assets.load().await;
        let html = render_invoice_html(invoice, &assets, Utc::now());

        let stem = format!("invoice-{}-{}", invoice.invoice_number, Uuid::new_v4());
        let html_path: PathBuf = std::env::temp_dir().join(format!("{stem}.html"));
        let pdf_path: PathBuf = std::env::temp_dir().join(format!("{stem}.pdf"));

        fs::write(&html_path, &html)
            .await
            .map_err(|e| AppError::Dependency(anyhow::anyhow!("failed to stage HTML: {}", e)))?;

        let result = match self.print_to_pdf(&html_path, &pdf_path).await {
            Ok(()) => fs::read(&pdf_path).await.map_err(|e| {
                AppError::Dependency(anyhow::anyhow!("failed to read rendered PDF: {}", e))
            }),
            Err(e) => Err(e),
        };

        let _ = fs::remove_file(&html_path).await;
        let _ = fs::remove_file(&pdf_path).await;

        match &result {
            Ok(bytes) => {
                metrics::counter!("invoice_pdf_render_success").increment(1);
                tracing::info!(
                    invoice_number = %invoice.invoice_number,
                    size = bytes.len(),
                    "Rendered invoice PDF"
                );
            }
            Err(_) => {
                metrics::counter!("invoice_pdf_render_failed").increment(1);
            }
        }

        result
    }
}

pub struct RenderAssets {
    pub logo: String,
    pub signature: String,
}

/// Fetches remote brand assets as data URIs. Every failure degrades to a
/// placeholder; this type has no error path.
pub struct AssetFetcher {
    client: reqwest::Client,
    logo_url: Option<String>,
    signature_url: Option<String>,
}

impl AssetFetcher {
    pub fn new(config: &PdfConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.asset_fetch_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(anyhow::anyhow!("asset HTTP client: {}", e)))?;
        Ok(Self {
            client,
            logo_url: config.logo_url.clone(),
            signature_url: config.signature_url.clone(),
        })
    }

    pub async fn load(&self) -> RenderAssets {
        RenderAssets {
            logo: self
                .fetch_or_placeholder(self.logo_url.as_deref(), "LOGO", 180, 60)
                .await,
            signature: self
                .fetch_or_placeholder(self.signature_url.as_deref(), "SIGNATURE", 120, 40)
                .await,
        }
    }

    async fn fetch_or_placeholder(
        &self,
        url: Option<&str>,
        label: &str,
        width: u32,
        height: u32,
    ) -> String {
        if let Some(url) = url {
            match self.fetch_data_uri(url).await {
                Ok(uri) => return uri,
                Err(e) => {
                    tracing::warn!(url, error = %e, "Asset fetch failed; using placeholder");
                }
            }
        }
        placeholder_data_uri(label, width, height)
    }

    async fn fetch_data_uri(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Dependency(anyhow::anyhow!("{}", e)))?;
        if !response.status().is_success() {
            return Err(AppError::Dependency(anyhow::anyhow!(
                "asset fetch returned {}",
                response.status()
            )));
        }
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Dependency(anyhow::anyhow!("{}", e)))?;
        Ok(format!("data:{};base64,{}", mime, STANDARD.encode(&bytes)))
    }
}

fn placeholder_data_uri(label: &str, width: u32, height: u32) -> String {
    let svg = format!(
        "<svg xmlns='http://www.w3.org/2000/svg' width='{width}' height='{height}'>\
         <rect width='100%' height='100%' fill='#f0f0f0' stroke='#ccc' stroke-dasharray='4'/>\
         <text x='50%' y='50%' dominant-baseline='middle' text-anchor='middle' \
         font-family='Arial' font-size='10' fill='#999'>{label}</text></svg>"
    );
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn multiline(input: &str) -> String {
    escape_html(input).replace('\n', "<br>")
}

fn money(amount: Decimal) -> String {
    format!("₹{:.2}", amount.round_dp(2))
}

/// Build the printable HTML for an invoice snapshot. Optional sections
/// (email, address, pending balance, tax, notes) are omitted when absent.
pub fn render_invoice_html(
    invoice: &Invoice,
    assets: &RenderAssets,
    generated_at: DateTime<Utc>,
) -> String {
    let total_project_value = invoice.total_project_value();

    let due_line = match (invoice.payment_type, invoice.due_date) {
        (PaymentType::InitialPayment, Some(due)) => {
            format!("Due Date: {}", due.format("%d/%m/%Y"))
        }
        _ => String::new(),
    };

    let email_line = if invoice.client_email.is_empty() {
        String::new()
    } else {
        format!("Email: {}<br>", escape_html(&invoice.client_email))
    };
    let address_line = if invoice.client_address.is_empty() {
        String::new()
    } else {
        multiline(&invoice.client_address)
    };

    let payment_banner = match invoice.payment_type {
        PaymentType::FullPayment => "FULL PAYMENT - PAID".to_string(),
        PaymentType::InitialPayment => {
            if invoice.pending_amount > Decimal::ZERO {
                "INITIAL PAYMENT - PENDING BALANCE".to_string()
            } else {
                "INITIAL PAYMENT - COMPLETED".to_string()
            }
        }
    };

    let item_rows: String = invoice
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td class='qty'>{}</td><td class='amount'>{}</td></tr>",
                escape_html(&item.description),
                item.quantity,
                money(item.amount()),
            )
        })
        .collect();

    let pending_row = if invoice.pending_amount > Decimal::ZERO {
        format!(
            "<div class='summary-row'><span>Pending Amount</span><span class='pending'>{}</span></div>",
            money(invoice.pending_amount)
        )
    } else {
        String::new()
    };

    let tax_row = if invoice.tax_percentage > Decimal::ZERO {
        let tax_amount = total_project_value * invoice.tax_percentage / Decimal::from(100);
        format!(
            "<div class='summary-row'><span>Tax ({}%)</span><span>{}</span></div>",
            invoice.tax_percentage,
            money(tax_amount)
        )
    } else {
        String::new()
    };

    let notes_section = if invoice.notes.is_empty() {
        String::new()
    } else {
        format!(
            "<div class='notes'><strong>Notes:</strong><br>{}</div>",
            multiline(&invoice.notes)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Invoice {number}</title>
<style>
  body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; color: #333; font-size: 12px; line-height: 1.4; }}
  .header {{ display: flex; justify-content: space-between; border-bottom: 3px solid #4CAF50; padding-bottom: 20px; margin-bottom: 30px; }}
  .header img {{ max-width: 180px; display: block; margin-bottom: 12px; }}
  .invoice-number {{ font-size: 20px; font-weight: bold; color: #2E3B82; }}
  .meta {{ text-align: right; font-size: 11px; color: #666; }}
  .section-title {{ font-size: 14px; font-weight: bold; color: #2E3B82; border-bottom: 1px solid #eee; padding-bottom: 5px; margin-bottom: 10px; }}
  .banner {{ margin: 20px 0; padding: 10px 14px; background: #f8f9fa; font-weight: bold; }}
  table {{ width: 100%; border-collapse: collapse; margin: 25px 0; border: 2px solid #333; }}
  th, td {{ border: 1px solid #333; padding: 10px; text-align: left; }}
  .qty {{ text-align: center; }}
  .amount {{ text-align: right; font-weight: bold; color: #2E3B82; }}
  .summary {{ margin-top: 25px; text-align: right; background: #f8f9fa; padding: 20px; }}
  .summary-row {{ display: flex; justify-content: flex-end; gap: 40px; margin-bottom: 6px; }}
  .summary-row.total {{ font-weight: bold; font-size: 14px; }}
  .pending {{ color: #c0392b; }}
  .notes {{ margin: 25px 0; padding: 15px; background: #f9f9f9; }}
  .footer {{ display: flex; justify-content: space-between; margin-top: 40px; font-size: 11px; color: #666; }}
  .footer img {{ max-width: 120px; display: block; margin-left: auto; margin-bottom: 8px; }}
</style>
</head>
<body>
  <div class="header">
    <div>
      <img src="{logo}" alt="Logo">
      <div class="invoice-number">Settlo Tech Solutions</div>
    </div>
    <div class="meta">
      <div class="invoice-number">INVOICE # {number}</div>
      Invoice Date: {invoice_date}<br>
      {due_line}
    </div>
  </div>
  <div>
    <div class="section-title">Bill To:</div>
    <strong>{client_name}</strong><br>
    Phone: {client_phone}<br>
    {email_line}{address_line}
  </div>
  <div class="banner">{payment_banner}</div>
  <table>
    <thead><tr><th>Description</th><th class="qty">Qty</th><th class="amount">Amount</th></tr></thead>
    <tbody>{item_rows}</tbody>
  </table>
  <div class="summary">
    <div class="summary-row"><span>Amount Collected</span><span>{collected}</span></div>
    {pending_row}{tax_row}
    <div class="summary-row total"><span>Total Project Value</span><span>{total}</span></div>
  </div>
  {notes_section}
  <div class="footer">
    <div>Generated on {generated_at}</div>
    <div><img src="{signature}" alt="Signature">Settlo Team Manager</div>
  </div>
</body>
</html>"#,
        number = escape_html(&invoice.invoice_number),
        logo = assets.logo,
        signature = assets.signature,
        invoice_date = invoice.invoice_date.format("%d/%m/%Y"),
        due_line = due_line,
        client_name = escape_html(&invoice.client_name),
        client_phone = escape_html(&invoice.client_phone),
        email_line = email_line,
        address_line = address_line,
        payment_banner = payment_banner,
        item_rows = item_rows,
        collected = money(invoice.collected_amount),
        pending_row = pending_row,
        tax_row = tax_row,
        total = money(total_project_value),
        notes_section = notes_section,
        generated_at = generated_at.format("%d/%m/%Y %H:%M"),
    )
}
