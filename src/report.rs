//! Text renderings of a computed loan: currency strings, the schedule table,
//! CSV/JSON exports and a balance-over-time chart.

use crate::error::LoanError;
use crate::loan::{AmortizationRow, AmortizationSchedule, LoanTerms};
use log::debug;
use std::io;
use tabled::{builder::Builder, settings::Style, Table};

pub const CHART_TITLE: &str = "Loan Amortization Schedule";
pub const DEFAULT_CHART_WIDTH: usize = 60;
pub const DEFAULT_CHART_HEIGHT: usize = 15;

/// Formats `amount` as dollars with thousands separators and two decimal places.
pub fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // no "-$0.00" for values that round away
    let negative = amount < 0. && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    format!("{}${}.{}", if negative { "-" } else { "" }, grouped, cents)
}

pub fn render_summary(terms: &LoanTerms, pmt_amount: f64, schedule: &AmortizationSchedule) -> String {
    format!(
        "Results\n\
         Monthly Payment: {}\n\
         Loan Amount: {}  Annual Interest Rate: {}%  Loan Term: {} years\n\
         Payments: {}  Total Interest: {}  Total Paid: {}\n",
        format_currency(pmt_amount),
        format_currency(terms.principal()),
        terms.annual_rate(),
        terms.term_years(),
        schedule.len(),
        format_currency(schedule.total_interest()),
        format_currency(schedule.total_paid())
    )
}

/// The full schedule as a text table with currency-formatted money columns.
pub fn render_table(schedule: &AmortizationSchedule) -> String {
    let mut builder = Builder::default();
    builder.push_record(AmortizationRow::COLUMNS);
    for row in schedule {
        builder.push_record([
            row.pmt_number.to_string(),
            format_currency(row.pmt_principal),
            format_currency(row.pmt_interest),
            format_currency(row.remaining_balance),
        ]);
    }

    let mut table = Table::from(builder);
    table.with(Style::rounded());
    table.to_string()
}

/// Writes the schedule as CSV with the display column names as headers and unformatted values.
pub fn write_csv<W: io::Write>(schedule: &AmortizationSchedule, writer: W) -> Result<(), LoanError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(AmortizationRow::COLUMNS)?;
    for row in schedule {
        wtr.write_record([
            row.pmt_number.to_string(),
            row.pmt_principal.to_string(),
            row.pmt_interest.to_string(),
            row.remaining_balance.to_string(),
        ])?;
    }
    wtr.flush()?;
    debug!("wrote {} csv rows", schedule.len());
    Ok(())
}

#[cfg(feature = "serde")]
pub fn to_json(pmt_amount: f64, schedule: &AmortizationSchedule) -> Result<String, LoanError> {
    let value = serde_json::json!({
        "monthly_payment": pmt_amount,
        "schedule": schedule,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Plots Remaining Balance against Payment Number on a `width` x `height` character grid.
///
/// Schedules longer than `width` are sampled evenly, always keeping the first and
/// last payment.
pub fn render_balance_chart(schedule: &AmortizationSchedule, width: usize, height: usize) -> String {
    let rows = schedule.rows();
    if rows.is_empty() {
        return format!("{}\n(no payments)\n", CHART_TITLE);
    }

    let width = width.max(2).min(rows.len().max(2));
    let height = height.max(2);
    let max_balance = rows
        .iter()
        .map(|r| r.remaining_balance)
        .fold(0., f64::max);
    let scale = if max_balance > 0. { max_balance } else { 1. };

    let mut grid = vec![vec![' '; width]; height];
    for col in 0..width {
        let idx = if rows.len() == 1 {
            0
        } else {
            col * (rows.len() - 1) / (width - 1)
        };
        let level = ((rows[idx].remaining_balance / scale) * (height - 1) as f64).round() as usize;
        grid[height - 1 - level.min(height - 1)][col] = '*';
    }

    let top_label = format_currency(max_balance);
    let bottom_label = format_currency(0.);
    let margin = top_label.len().max(bottom_label.len());

    let mut lines = vec![CHART_TITLE.to_string(), "Amount ($)".to_string()];
    for (i, cells) in grid.iter().enumerate() {
        let label = if i == 0 {
            top_label.as_str()
        } else if i == height - 1 {
            bottom_label.as_str()
        } else {
            ""
        };
        let plot: String = cells.iter().collect();
        lines.push(format!("{:>margin$} |{}", label, plot.trim_end()));
    }
    lines.push(format!("{:>margin$} +{}", "", "-".repeat(width)));

    let first = rows[0].pmt_number.to_string();
    let last = rows[rows.len() - 1].pmt_number.to_string();
    let gap = width.saturating_sub(first.len() + last.len()).max(1);
    lines.push(format!("{:>margin$}  {}{}{}", "", first, " ".repeat(gap), last));
    lines.push(format!("{:>margin$}  Payment Number", ""));
    lines.push(format!("{:>margin$}  * Remaining Balance", ""));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::{format_currency, render_balance_chart, render_summary, render_table, write_csv};
    use crate::loan::{generate_amortization_schedule, AmortizationSchedule, LoanTerms};
    use test_log::test;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1342.0540575), "$1,342.05");
        assert_eq!(format_currency(250000.), "$250,000.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(0.), "$0.00");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_currency(-1500.25), "-$1,500.25");
        assert_eq!(format_currency(-0.001), "$0.00");
        assert_eq!(format_currency(833.3333333), "$833.33");
    }

    #[test]
    fn test_render_summary() {
        let terms = LoanTerms::new(250000., 5., 30).unwrap();
        let summary = render_summary(&terms, terms.monthly_payment(), &terms.schedule());

        assert!(summary.starts_with("Results\n"));
        assert_eq!(summary.lines().count(), 4);
        assert!(summary.ends_with('\n'));
        assert!(summary.contains("Monthly Payment: $1,342.05"));
        assert!(summary.contains("Payments: 360"));
        assert!(summary.contains("Total Interest: $233,139.46"));
    }

    #[test]
    fn test_render_table() {
        let schedule = generate_amortization_schedule(10000., 0., 1);
        let table = render_table(&schedule);
        let lines: Vec<&str> = table.lines().collect();

        let header = lines.iter().find(|l| l.contains("Payment Number")).unwrap();
        let cols = [
            "Payment Number",
            "Principal Payment",
            "Interest Payment",
            "Remaining Balance",
        ];
        let positions: Vec<usize> = cols.iter().map(|c| header.find(c).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        // twelve principal payments plus the balance after payment 11
        assert_eq!(table.matches("$833.33").count(), 13);
        assert!(table.contains("$9,166.67"));
        assert!(table.contains("$0.00"));
    }

    #[test]
    fn test_write_csv() {
        let schedule = generate_amortization_schedule(10000., 0., 1);
        let mut buf = Vec::new();
        write_csv(&schedule, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Payment Number,Principal Payment,Interest Payment,Remaining Balance")
        );
        assert_eq!(lines.count(), 12);
        assert!(text.contains("\n1,833.3333333333334,0,9166.666666666666\n"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_to_json() {
        let schedule = generate_amortization_schedule(0., 5., 1);
        let json = super::to_json(0., &schedule).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["monthly_payment"], 0.);
        let rows = value["schedule"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Payment Number"], 1);
        assert_eq!(rows[0]["Remaining Balance"], 0.);
    }

    #[test]
    fn test_render_balance_chart() {
        let schedule = generate_amortization_schedule(250000., 5., 30);
        let chart = render_balance_chart(&schedule, 40, 10);
        let lines: Vec<&str> = chart.lines().collect();

        assert_eq!(lines.len(), 2 + 10 + 4);
        assert!(chart.ends_with("* Remaining Balance\n"));
        assert_eq!(lines[0], "Loan Amortization Schedule");
        assert_eq!(lines[1], "Amount ($)");
        // one plotted point per column
        assert_eq!(chart.matches('*').count(), 40 + 1);
        // first payment sits on the top row, the paid-off balance on the bottom row
        assert!(lines[2].contains("|*"));
        assert!(lines[11].trim_end().ends_with('*'));
        assert!(lines[11].trim_start().starts_with("$0.00"));
        assert!(chart.contains("Payment Number"));
        assert!(chart.contains("360"));
    }

    #[test]
    fn test_render_balance_chart_edge_cases() {
        let chart = render_balance_chart(&AmortizationSchedule::default(), 40, 10);
        assert_eq!(chart, "Loan Amortization Schedule\n(no payments)\n");

        let schedule = generate_amortization_schedule(0., 5., 30);
        let chart = render_balance_chart(&schedule, 40, 10);
        assert!(chart.contains('*'));
        assert!(chart.contains("$0.00"));
    }
}
