//! Plain-text rendering of the report for the terminal dashboard.

use crate::metrics::{self, DashboardSummary, PLACEHOLDER};
use crate::report::{Collection, Field, ProjectReport};
use crate::sync::SyncStatus;
use chrono::Local;
use std::fmt::Write;

const RULE_WIDTH: usize = 60;

/// Sections of the report and the scalar fields shown in each, in order.
pub const SECTIONS: [(&str, &[Field]); 6] = [
    (
        "Project Overview",
        &[
            Field::ReportDate,
            Field::KeyPersonnel,
            Field::ContractStatus,
            Field::Subconsultants,
            Field::ContractValue,
        ],
    ),
    (
        "Project Status",
        &[
            Field::ProjectStatus,
            Field::ProgressPct,
            Field::StagePlannedPct,
            Field::StageActualPct,
        ],
    ),
    (
        "Payment Status",
        &[Field::ClientPayments, Field::SubsPayments],
    ),
    (
        "Budget & Financials",
        &[
            Field::BudgetStatus,
            Field::InternalBudget,
            Field::ExternalBudget,
            Field::AvailableBudget,
            Field::ActualSpent,
            Field::EarnedValue,
            Field::InvoiceSubmitted,
            Field::ExternalActualSpent,
            Field::TargetInvoice,
            Field::InvoiceDueDate,
        ],
    ),
    ("Program", &[]),
    (
        "Variations & Risks",
        &[Field::PotentialVariations, Field::CriticalIssues],
    ),
];

/// Save indicator: `Saving…` while a write is in flight, `Saved HH:MM`
/// (local time) after a successful one, otherwise empty.
pub fn save_indicator(status: &SyncStatus) -> String {
    if status.saving() {
        return "Saving\u{2026}".to_string();
    }
    match status.saved_at {
        Some(at) => format!("Saved {}", at.with_timezone(&Local).format("%H:%M")),
        None => String::new(),
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
}

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() { PLACEHOLDER } else { value }
}

fn render_rows(out: &mut String, report: &ProjectReport, collection: Collection, title: &str) {
    let _ = writeln!(out, "{title}");
    let columns = collection.columns();
    let header: Vec<&str> = columns.iter().map(|c| c.wire_name()).collect();
    let _ = writeln!(out, "  #  {}", header.join(" | "));
    for index in 0..report.row_count(collection) {
        let cells: Vec<&str> = columns
            .iter()
            .map(|&column| or_placeholder(report.row_value(collection, index, column).unwrap_or("")))
            .collect();
        let _ = writeln!(out, "  {index:<2} {}", cells.join(" | "));
    }
}

fn derived_line(summary: &DashboardSummary, title: &str) -> Option<String> {
    match title {
        "Project Status" => {
            let stage = summary
                .stage_status
                .map_or(PLACEHOLDER, |status| status.label());
            Some(format!(
                "  Progress {}%  Stage {}",
                summary.progress, stage
            ))
        }
        "Budget & Financials" => {
            let glyph = summary.balance.glyph().unwrap_or("");
            Some(format!(
                "  Balance {glyph}{}  CPI {}  CV {}",
                summary.balance.display(),
                summary.cost_performance.display(),
                summary.cash_variance.display()
            ))
        }
        _ => None,
    }
}

/// Renders the full report with its derived indicators.
pub fn render_report(report: &ProjectReport) -> String {
    let summary = metrics::summarize(report);
    let mut out = String::new();
    let _ = writeln!(out, "{}", summary.title);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    for (title, fields) in SECTIONS {
        heading(&mut out, title);
        for &field in fields {
            let _ = writeln!(out, "  {}: {}", field.label(), or_placeholder(report.field(field)));
        }
        if let Some(line) = derived_line(&summary, title) {
            let _ = writeln!(out, "{line}");
        }
        if title == "Program" {
            render_rows(&mut out, report, Collection::ProgramRows, "  Stages");
        }
    }

    heading(&mut out, "Weekly Actions");
    render_rows(&mut out, report, Collection::CurrentActions, "  This Week's Actions");
    render_rows(&mut out, report, Collection::NextActions, "  Next Week's Actions");

    if !report.extra.is_empty() {
        let keys: Vec<&str> = report.extra.keys().map(String::as_str).collect();
        let _ = writeln!(out);
        let _ = writeln!(out, "Other stored keys: {}", keys.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Lifecycle;
    use chrono::Utc;

    fn idle_status() -> SyncStatus {
        SyncStatus {
            lifecycle: Lifecycle::Ready,
            load_outcome: None,
            pending: false,
            saves_in_flight: 0,
            saved_at: None,
            last_attempt_at: None,
        }
    }

    #[test]
    fn indicator_follows_save_state() {
        let mut status = idle_status();
        assert_eq!(save_indicator(&status), "");

        status.saved_at = Some(Utc::now());
        assert!(save_indicator(&status).starts_with("Saved "));

        status.saves_in_flight = 1;
        assert_eq!(save_indicator(&status), "Saving\u{2026}");
    }

    #[test]
    fn every_scalar_field_is_shown_once() {
        let shown: Vec<Field> = SECTIONS
            .iter()
            .flat_map(|(_, fields)| fields.iter().copied())
            .collect();
        for field in Field::ALL {
            let header = matches!(field, Field::ProjectCode | Field::ProjectName | Field::Client);
            let count = shown.iter().filter(|&&f| f == field).count();
            assert_eq!(count, usize::from(!header), "{field}");
        }
    }

    #[test]
    fn report_shows_title_and_derived_values() {
        let report = ProjectReport::default()
            .with_field(Field::ProjectCode, "DT-104")
            .with_field(Field::AvailableBudget, "1,000")
            .with_field(Field::ActualSpent, "250")
            .with_field(Field::StagePlannedPct, "40")
            .with_field(Field::StageActualPct, "55");
        let text = render_report(&report);
        assert!(text.starts_with("DT-104\n"));
        assert!(text.contains("Balance \u{25b2}+750"));
        assert!(text.contains("Stage Ahead"));
        assert!(text.contains("Weekly Actions"));
    }
}
