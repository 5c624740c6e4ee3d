//! Result mapper: converts a raw provider extraction into normalized
//! document fields and line-item drafts.

use crate::models::{DocumentFields, ItemDraft};
use crate::services::analysis::ExtractionResult;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Normalized mapping output. Party names stay unresolved here; the worker
/// resolves them against the repository best-effort.
#[derive(Debug, Clone)]
pub struct MappedDocument {
    pub fields: DocumentFields,
    pub customer_name: Option<String>,
    pub vendor_name: Option<String>,
    pub items: Vec<ItemDraft>,
}

pub fn map_extraction(extraction: &ExtractionResult) -> MappedDocument {
    let raw = &extraction.fields;

    let fields = DocumentFields {
        document_number: clean_text(raw.document_number.as_deref()),
        total_amount: raw.total.as_deref().and_then(parse_amount),
        subtotal_amount: raw.subtotal.as_deref().and_then(parse_amount),
        discount_amount: raw.discount.as_deref().and_then(parse_amount),
        tax_amount: raw.tax.as_deref().and_then(parse_amount),
        currency_code: clean_text(raw.currency.as_deref()).map(|c| c.to_uppercase()),
        payment_terms: clean_text(raw.payment_terms.as_deref()),
        due_date: raw.due_date.as_deref().and_then(parse_date),
    };

    let items = extraction
        .line_items
        .iter()
        .filter_map(|line| {
            // A line without a description is OCR noise, not an item.
            let description = clean_text(line.description.as_deref())?;
            Some(ItemDraft {
                description,
                quantity: line
                    .quantity
                    .as_deref()
                    .and_then(parse_quantity)
                    .unwrap_or(1),
                unit: clean_text(line.unit.as_deref()),
                unit_price: line.unit_price.as_deref().and_then(parse_amount),
                amount: line.amount.as_deref().and_then(parse_amount),
            })
        })
        .collect();

    MappedDocument {
        fields,
        customer_name: clean_text(raw.customer_name.as_deref()),
        vendor_name: clean_text(raw.vendor_name.as_deref()),
        items,
    }
}

fn clean_text(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse an OCR'd monetary value: currency symbols and thousands separators
/// are stripped before the decimal parse.
fn parse_amount(value: &str) -> Option<Decimal> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Quantities are whole units, never negative.
fn parse_quantity(value: &str) -> Option<i64> {
    let quantity = Decimal::from_str(value.trim()).ok()?;
    let as_int = quantity.trunc().to_i64()?;
    Some(as_int.max(0))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::{RawFields, RawLineItem};
    use rust_decimal::Decimal;

    fn extraction(fields: RawFields, line_items: Vec<RawLineItem>) -> ExtractionResult {
        ExtractionResult {
            raw: serde_json::json!({}),
            fields,
            line_items,
        }
    }

    #[test]
    fn maps_amounts_currency_and_due_date() {
        let result = map_extraction(&extraction(
            RawFields {
                document_number: Some("INV-2041".to_string()),
                total: Some("$1,250.00".to_string()),
                subtotal: Some("1200.00".to_string()),
                tax: Some("50.00".to_string()),
                currency: Some("usd".to_string()),
                due_date: Some("2026-09-30".to_string()),
                ..Default::default()
            },
            vec![],
        ));

        assert_eq!(result.fields.document_number.as_deref(), Some("INV-2041"));
        assert_eq!(
            result.fields.total_amount,
            Some(Decimal::from_str("1250.00").unwrap())
        );
        assert_eq!(result.fields.currency_code.as_deref(), Some("USD"));
        assert_eq!(
            result.fields.due_date,
            Some(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap())
        );
    }

    #[test]
    fn drops_items_without_description() {
        let result = map_extraction(&extraction(
            RawFields::default(),
            vec![
                RawLineItem {
                    description: Some("Widgets".to_string()),
                    quantity: Some("3".to_string()),
                    amount: Some("30.00".to_string()),
                    ..Default::default()
                },
                RawLineItem {
                    description: Some("   ".to_string()),
                    amount: Some("99.00".to_string()),
                    ..Default::default()
                },
            ],
        ));

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].description, "Widgets");
        assert_eq!(result.items[0].quantity, 3);
    }

    #[test]
    fn quantity_never_goes_negative() {
        let result = map_extraction(&extraction(
            RawFields::default(),
            vec![RawLineItem {
                description: Some("Credit line".to_string()),
                quantity: Some("-2".to_string()),
                ..Default::default()
            }],
        ));

        assert_eq!(result.items[0].quantity, 0);
    }

    #[test]
    fn unparseable_values_stay_null() {
        let result = map_extraction(&extraction(
            RawFields {
                total: Some("illegible".to_string()),
                due_date: Some("sometime soon".to_string()),
                ..Default::default()
            },
            vec![],
        ));

        assert!(result.fields.total_amount.is_none());
        assert!(result.fields.due_date.is_none());
    }
}
