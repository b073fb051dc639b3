//! Terminal presentation of valuation results
//!
//! Formats the valuation table and draws the ledger history as a text line
//! chart. Rounding happens here and only here.

pub mod pdf;

use crate::history::HistorySample;
use crate::valuation::ValuationRow;

pub const CHART_TITLE: &str = "Portfolio Value Over Time";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format with thousands separators: 1234567.891 -> "1,234,567.89"
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Money amount in the reference currency: "$1,234.56" or "1,234.56 EUR"
pub fn format_money(value: f64, currency: &str) -> String {
    let grouped = format_grouped(value, 2);
    if currency.eq_ignore_ascii_case("usd") {
        match grouped.strip_prefix('-') {
            Some(abs) => format!("-${}", abs),
            None => format!("${}", grouped),
        }
    } else {
        format!("{} {}", grouped, currency.to_uppercase())
    }
}

fn format_price(price: f64) -> String {
    if price != 0.0 && price.abs() < 1.0 {
        format_grouped(price, 6)
    } else {
        format_grouped(price, 2)
    }
}

fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format_grouped(quantity, 0)
    } else {
        format_grouped(quantity, 4)
    }
}

/// Valuation table with a total line. Unquoted assets show "n/a".
pub fn render_table(rows: &[ValuationRow], total: f64, currency: &str) -> String {
    let ccy = currency.to_uppercase();
    let headers = [
        "Crypto".to_string(),
        "Holding".to_string(),
        format!("Price ({})", ccy),
        format!("Total Value ({})", ccy),
    ];

    let body: Vec<[String; 4]> = rows
        .iter()
        .map(|row| {
            [
                row.asset.display_name.clone(),
                format_quantity(row.asset.held_quantity),
                if row.quoted { format_price(row.price) } else { "n/a".to_string() },
                format_grouped(row.value, 2),
            ]
        })
        .collect();

    let mut widths = headers.clone().map(|h| h.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String; 4]| {
        format!(
            "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
            cells[0],
            cells[1],
            cells[2],
            cells[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3]
        )
    };

    let mut out = String::new();
    out.push_str(&line(&headers));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 6));
    out.push('\n');
    for cells in &body {
        out.push_str(&line(cells));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format!("Current Portfolio Value: {}", format_money(total, currency)));
    out
}

/// Text line chart of the history, x = time, y = total value.
pub fn render_chart(
    samples: &[HistorySample],
    currency: &str,
    width: usize,
    height: usize,
) -> String {
    if samples.is_empty() {
        return format!("{}\n(no samples yet)", CHART_TITLE);
    }

    let width = width.max(2);
    let height = height.max(2);

    let (min, max) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.total_value), hi.max(s.total_value))
    });

    let row_of = |value: f64| -> usize {
        if max > min {
            (((value - min) / (max - min)) * (height - 1) as f64).round() as usize
        } else {
            height / 2
        }
    };

    // Value at each column, interpolated between neighbouring samples
    let column_values: Vec<f64> = if samples.len() == 1 {
        vec![samples[0].total_value]
    } else {
        (0..width)
            .map(|col| {
                let pos = col as f64 * (samples.len() - 1) as f64 / (width - 1) as f64;
                let left = pos.floor() as usize;
                let right = (left + 1).min(samples.len() - 1);
                let frac = pos - left as f64;
                let (from, to) = (samples[left].total_value, samples[right].total_value);
                from + (to - from) * frac
            })
            .collect()
    };

    let mut grid = vec![vec![' '; column_values.len()]; height];
    for (col, value) in column_values.iter().enumerate() {
        grid[height - 1 - row_of(*value)][col] = '*';
    }

    let top_label = format_money(max, currency);
    let bottom_label = format_money(min, currency);
    let label_width = top_label.len().max(bottom_label.len());

    let mut out = String::new();
    out.push_str(CHART_TITLE);
    out.push('\n');
    for (i, row) in grid.iter().enumerate() {
        let label = if i == 0 {
            top_label.as_str()
        } else if i == height - 1 {
            bottom_label.as_str()
        } else {
            ""
        };
        let line: String = row.iter().collect();
        out.push_str(&format!("{:>w$} |{}\n", label, line.trim_end(), w = label_width));
    }
    out.push_str(&format!("{:>w$} +{}\n", "", "-".repeat(column_values.len()), w = label_width));

    let first = samples[0].timestamp.format(TIME_FORMAT).to_string();
    let last = samples[samples.len() - 1].timestamp.format(TIME_FORMAT).to_string();
    if samples.len() == 1 {
        out.push_str(&format!("{:>w$}  {}", "", first, w = label_width));
    } else {
        let gap = (column_values.len() + 1).saturating_sub(first.len() + last.len()).max(1);
        out.push_str(&format!("{:>w$}  {}{}{}", "", first, " ".repeat(gap), last, w = label_width));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holdings::AssetEntry;
    use chrono::{TimeZone, Utc};

    fn sample(secs: i64, total_value: f64) -> HistorySample {
        HistorySample {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            total_value,
        }
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(0.0, 2), "0.00");
        assert_eq!(format_grouped(999.999, 2), "1,000.00");
        assert_eq!(format_grouped(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_grouped(5137231.0, 0), "5,137,231");
        assert_eq!(format_grouped(-1234.5, 1), "-1,234.5");
        assert_eq!(format_grouped(-0.001, 2), "0.00");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234.56, "usd"), "$1,234.56");
        assert_eq!(format_money(1234.56, "USD"), "$1,234.56");
        assert_eq!(format_money(-5.0, "usd"), "-$5.00");
        assert_eq!(format_money(1234.5, "eur"), "1,234.50 EUR");
    }

    #[test]
    fn test_render_table() {
        let rows = vec![
            ValuationRow {
                asset: AssetEntry::new("Ethereum (ETH)", 5427.0, "ethereum"),
                price: 2000.0,
                value: 10_854_000.0,
                quoted: true,
            },
            ValuationRow {
                asset: AssetEntry::new("Nym (NYM)", 4285719.0, "nym"),
                price: 0.0,
                value: 0.0,
                quoted: false,
            },
        ];

        let table = render_table(&rows, 10_854_000.0, "usd");
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("Crypto"));
        assert!(lines[0].contains("Price (USD)"));
        assert!(lines[2].contains("5,427"));
        assert!(lines[2].contains("2,000.00"));
        assert!(lines[2].ends_with("10,854,000.00"));
        assert!(lines[3].contains("n/a"));
        assert_eq!(lines.last().copied(), Some("Current Portfolio Value: $10,854,000.00"));
    }

    #[test]
    fn test_render_chart_empty() {
        assert!(render_chart(&[], "usd", 40, 8).contains("no samples"));
    }

    #[test]
    fn test_render_chart_single_sample() {
        let chart = render_chart(&[sample(0, 100.0)], "usd", 40, 8);
        assert_eq!(chart.matches('*').count(), 1);
        assert!(chart.contains("$100.00"));
    }

    #[test]
    fn test_render_chart_rising_line() {
        let chart = render_chart(&[sample(0, 100.0), sample(60, 150.0)], "usd", 20, 6);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines[0], CHART_TITLE);
        // max label on the top row, min label on the bottom row
        assert!(lines[1].trim_start().starts_with("$150.00"));
        assert!(lines[6].trim_start().starts_with("$100.00"));
        // one point per column, first on the bottom row, last on the top row
        assert_eq!(chart.matches('*').count(), 20);
        assert!(lines[1].ends_with('*'));
        assert!(lines[6].contains("|*"));
    }
}
