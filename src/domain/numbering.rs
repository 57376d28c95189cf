//! Per-type sequential invoice numbers, formatted `{TYPE}-{NNN}`.

use crate::error::AppError;
use crate::models::InvoiceType;

/// Format a sequence number, zero-padded to three digits. Sequences past 999
/// simply grow wider.
pub fn format_invoice_number(invoice_type: InvoiceType, seq: u32) -> String {
    format!("{}-{:03}", invoice_type.as_str(), seq)
}

/// Derive the next number in a type's sequence from the most recently issued
/// one. No prior invoice means sequence 1.
///
/// A latest number whose suffix does not parse as an integer is a hard error:
/// silently restarting at 1 would collide with existing numbers.
pub fn next_invoice_number(
    invoice_type: InvoiceType,
    latest: Option<&str>,
) -> Result<String, AppError> {
    let seq = match latest {
        None => 1,
        Some(number) => {
            let current = parse_sequence(number).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "latest {} invoice number {:?} has a non-numeric suffix; refusing to derive the next number",
                    invoice_type.as_str(),
                    number
                ))
            })?;
            current + 1
        }
    };
    Ok(format_invoice_number(invoice_type, seq))
}

fn parse_sequence(number: &str) -> Option<u32> {
    let (_, suffix) = number.split_once('-')?;
    suffix.parse().ok()
}
