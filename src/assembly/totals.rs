//! Line-item arithmetic for invoice-like documents.
//!
//! Each row is rounded to two decimals first; totals are sums of the rounded
//! row values. Malformed numbers count as zero.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::record::{DataRecord, FieldValue, RowRecord};

pub const QUANTITY: &str = "quantity";
pub const UNIT_PRICE: &str = "unitPrice";
pub const TAX_RATE_PERCENT: &str = "taxRatePercent";

pub const NET_VALUE: &str = "netValue";
pub const TAX_VALUE: &str = "taxValue";
pub const GROSS_VALUE: &str = "grossValue";

pub const TOTAL_NET: &str = "totalNet";
pub const TOTAL_TAX: &str = "totalTax";
pub const TOTAL_GROSS: &str = "totalGross";

/// Round half away from zero to two decimal places.
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format an amount with exactly two decimals.
pub fn format_amount(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Lenient numeric parse: accepts a decimal comma, yields 0 for anything
/// unparseable or non-finite.
pub fn parse_numeric(value: Option<&FieldValue>) -> f64 {
    let parsed = match value {
        Some(FieldValue::Number(number)) => Some(*number),
        Some(FieldValue::Text(text)) => text.trim().replace(',', ".").parse::<f64>().ok(),
        Some(FieldValue::Null) | None => None,
    };
    parsed.filter(|number| number.is_finite()).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    pub net_value: f64,
    pub tax_value: f64,
    pub gross_value: f64,
}

impl LineTotals {
    pub fn from_row(row: &RowRecord) -> Self {
        let quantity = parse_numeric(row.get(QUANTITY));
        let unit_price = parse_numeric(row.get(UNIT_PRICE));
        let tax_rate = parse_numeric(row.get(TAX_RATE_PERCENT));

        let net_value = round2(quantity * unit_price);
        let tax_value = round2(net_value * tax_rate / 100.0);
        let gross_value = round2(net_value + tax_value);

        Self {
            net_value,
            tax_value,
            gross_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub lines: Vec<LineTotals>,
    pub total_net: f64,
    pub total_tax: f64,
    pub total_gross: f64,
}

impl Totals {
    /// Write per-row values into the record's rows and totals into its
    /// scalar fields, all formatted with two decimals.
    pub fn apply_to(&self, record: &mut DataRecord) {
        if let Some(rows) = record.rows_mut() {
            for (row, line) in rows.iter_mut().zip(&self.lines) {
                row.insert(NET_VALUE.to_string(), format_amount(line.net_value).into());
                row.insert(TAX_VALUE.to_string(), format_amount(line.tax_value).into());
                row.insert(GROSS_VALUE.to_string(), format_amount(line.gross_value).into());
            }
        }

        record.insert(TOTAL_NET, format_amount(self.total_net));
        record.insert(TOTAL_TAX, format_amount(self.total_tax));
        record.insert(TOTAL_GROSS, format_amount(self.total_gross));
    }
}

pub fn compute_totals(rows: &[RowRecord]) -> Totals {
    let lines: Vec<LineTotals> = rows.iter().map(LineTotals::from_row).collect();

    let total_net = round2(lines.iter().map(|line| line.net_value).sum());
    let total_tax = round2(lines.iter().map(|line| line.tax_value).sum());
    let total_gross = round2(lines.iter().map(|line| line.gross_value).sum());

    Totals {
        lines,
        total_net,
        total_tax,
        total_gross,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::record::row;

    fn line(quantity: &str, unit_price: &str, tax_rate: &str) -> RowRecord {
        row([
            (QUANTITY, quantity),
            (UNIT_PRICE, unit_price),
            (TAX_RATE_PERCENT, tax_rate),
        ])
    }

    #[test]
    fn test_invoice_example() {
        let totals = compute_totals(&[line("2", "100", "23"), line("1", "50", "23")]);

        assert_eq!(totals.lines[0].net_value, 200.0);
        assert_eq!(totals.lines[0].tax_value, 46.0);
        assert_eq!(totals.lines[0].gross_value, 246.0);
        assert_eq!(totals.lines[1].net_value, 50.0);
        assert_eq!(totals.lines[1].tax_value, 11.5);
        assert_eq!(totals.lines[1].gross_value, 61.5);
        assert_eq!(totals.total_net, 250.0);
        assert_eq!(totals.total_tax, 57.5);
        assert_eq!(totals.total_gross, 307.5);
    }

    #[test]
    fn test_rows_are_rounded_before_summing() {
        // 3 * 0.333 = 0.999 -> 1.00 per row; the unrounded sum would be 1.998
        let totals = compute_totals(&[line("3", "0.333", "0"), line("3", "0.333", "0")]);
        assert_eq!(totals.total_net, 2.0);
    }

    #[test]
    fn test_malformed_numbers_count_as_zero() {
        let totals = compute_totals(&[line("abc", "100", "23"), line("1", "10", "x")]);
        assert_eq!(totals.lines[0].net_value, 0.0);
        assert_eq!(totals.lines[1].tax_value, 0.0);
        assert_eq!(totals.total_net, 10.0);
        assert_eq!(totals.total_gross, 10.0);
    }

    #[test]
    fn test_parse_numeric_variants() {
        assert_eq!(parse_numeric(Some(&FieldValue::from(" 12,5 "))), 12.5);
        assert_eq!(parse_numeric(Some(&FieldValue::Number(4.0))), 4.0);
        assert_eq!(parse_numeric(Some(&FieldValue::from("inf"))), 0.0);
        assert_eq!(parse_numeric(Some(&FieldValue::Null)), 0.0);
        assert_eq!(parse_numeric(None), 0.0);
    }

    #[test]
    fn test_decimal_comma_does_not_rescue_malformed_numbers() {
        assert_eq!(parse_numeric(Some(&FieldValue::from("12,5"))), 12.5);
        assert_eq!(parse_numeric(Some(&FieldValue::from("1.2.3"))), 0.0);
        assert_eq!(parse_numeric(Some(&FieldValue::from("12,5,0"))), 0.0);
        assert_eq!(parse_numeric(Some(&FieldValue::from("1.000,50"))), 0.0);
        assert_eq!(parse_numeric(Some(&FieldValue::from(","))), 0.0);

        let totals = compute_totals(&[line("1.2.3", "100", "23"), line("2", "12,5,0", "0")]);
        assert_eq!(totals.total_gross, 0.0);
    }

    #[test]
    fn test_apply_to_writes_formatted_values() {
        let mut record = DataRecord::new().with_list("products", vec![line("2", "100", "23")]);
        let totals = compute_totals(record.rows("products"));
        totals.apply_to(&mut record);

        let first = &record.rows("products")[0];
        assert_eq!(first.get(NET_VALUE), Some(&FieldValue::from("200.00")));
        assert_eq!(first.get(GROSS_VALUE), Some(&FieldValue::from("246.00")));
        assert_eq!(record.get(TOTAL_TAX), Some(&FieldValue::from("46.00")));
    }

    #[test]
    fn test_round2_normalises_negative_zero() {
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(-2.5), -2.5);
    }
}
