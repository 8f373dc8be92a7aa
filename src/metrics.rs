//! Derived display values.
//!
//! Everything here is a pure function of the current field text. Nothing is
//! stored: values are recomputed whenever the dashboard is drawn. Number
//! parsing is deliberately lenient and mirrors JavaScript's `parseFloat` and
//! `parseInt`, so text that does not start with a number is "undefined"
//! rather than an error.

use crate::report::ProjectReport;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NON_NUMERIC: Regex = Regex::new(r"[^0-9.\-]").unwrap();
    static ref FLOAT_PREFIX: Regex =
        Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap();
    static ref INT_PREFIX: Regex = Regex::new(r"^[+-]?[0-9]+").unwrap();
}

/// Placeholder shown for an undefined or zero value.
pub const PLACEHOLDER: &str = "\u{2014}";

/// Background and text colour of a badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
}

const NEUTRAL: Palette = Palette {
    background: "#f1f5f9",
    foreground: "#64748b",
};

/// Longest numeric prefix of `text` after leading whitespace.
///
/// # Examples
/// ```
/// use project_dashboard::metrics::parse_float;
///
/// assert_eq!(parse_float(" 12.5kg"), Some(12.5));
/// assert_eq!(parse_float("1.2.3"), Some(1.2));
/// assert_eq!(parse_float("abc"), None);
/// ```
pub fn parse_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let unsigned = text.trim_start_matches(['+', '-']);
    if unsigned.starts_with("Infinity") && text.len() - unsigned.len() <= 1 {
        return Some(if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    FLOAT_PREFIX.find(text)?.as_str().parse().ok()
}

/// Integer prefix of `text` after leading whitespace, base 10.
pub fn parse_int(text: &str) -> Option<i64> {
    let digits = INT_PREFIX.find(text.trim_start())?.as_str();
    match digits.parse::<i64>() {
        Ok(n) => Some(n),
        // too long for i64, saturate the way a float would
        Err(_) if digits.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// Parses a currency-like amount such as `"AED 1,250.50"`.
///
/// Every character other than digits, `.` and `-` is removed first, then the
/// remaining text is read like [`parse_float`].
pub fn parse_amount(text: &str) -> Option<f64> {
    parse_float(&NON_NUMERIC.replace_all(text, ""))
}

// Math.round: halves go towards positive infinity
fn js_round(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn round_to_five(value: f64) -> f64 {
    js_round(value / 5.0) * 5.0
}

/// Current stage progress compared with plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Ahead,
    Delay,
    OnTrack,
}

impl StageStatus {
    pub fn label(self) -> &'static str {
        match self {
            StageStatus::Ahead => "Ahead",
            StageStatus::Delay => "Delay",
            StageStatus::OnTrack => "On Track",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            StageStatus::Ahead => Palette {
                background: "#f0fdf4",
                foreground: "#16a34a",
            },
            StageStatus::Delay => Palette {
                background: "#fef2f2",
                foreground: "#dc2626",
            },
            StageStatus::OnTrack => Palette {
                background: "#eff6ff",
                foreground: "#2563eb",
            },
        }
    }
}

/// Classifies planned against actual stage progress.
///
/// Both percentages are rounded to the nearest multiple of 5 before being
/// compared. Returns `None` when both inputs are empty; when only one side is
/// a number the status is `OnTrack`.
///
/// # Arguments
/// * `planned` - planned progress text, e.g. `"47"`
/// * `actual` - actual progress text, e.g. `"53"`
pub fn stage_status(planned: &str, actual: &str) -> Option<StageStatus> {
    if planned.is_empty() && actual.is_empty() {
        return None;
    }
    let planned = parse_float(planned).map(round_to_five);
    let actual = parse_float(actual).map(round_to_five);
    let status = match (planned, actual) {
        (Some(p), Some(a)) if p > a => StageStatus::Delay,
        (Some(p), Some(a)) if a > p => StageStatus::Ahead,
        _ => StageStatus::OnTrack,
    };
    Some(status)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

/// Remaining resource budget (`available - spent`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Balance {
    pub amount: f64,
}

impl Balance {
    pub fn tone(&self) -> Tone {
        if self.amount == 0.0 {
            Tone::Neutral
        } else if self.amount > 0.0 {
            Tone::Positive
        } else {
            Tone::Negative
        }
    }

    /// Signed amount with thousands separators, or the placeholder for zero.
    pub fn display(&self) -> String {
        if self.tone() == Tone::Neutral {
            return PLACEHOLDER.to_string();
        }
        let sign = if self.amount > 0.0 { "+" } else { "-" };
        let whole = format!("{:.0}", self.amount.abs().round());
        format!("{sign}{}", group_thousands(&whole))
    }

    /// Arrow shown before the amount; none for a zero balance.
    pub fn glyph(&self) -> Option<&'static str> {
        match self.tone() {
            Tone::Positive => Some("\u{25b2}"),
            Tone::Negative => Some("\u{25bc}"),
            Tone::Neutral => None,
        }
    }

    pub fn palette(&self) -> Palette {
        match self.tone() {
            Tone::Positive => Palette {
                background: "#dcfce7",
                foreground: "#166534",
            },
            Tone::Negative => Palette {
                background: "#fee2e2",
                foreground: "#991b1b",
            },
            Tone::Neutral => NEUTRAL,
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Balance of two amounts; unparseable text counts as zero.
pub fn balance(available: &str, spent: &str) -> Balance {
    let available = parse_amount(available).unwrap_or(0.0);
    let spent = parse_amount(spent).unwrap_or(0.0);
    Balance {
        amount: available - spent,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatioBand {
    Good,
    Caution,
    Poor,
}

impl RatioBand {
    pub fn of(value: f64) -> RatioBand {
        if value >= 1.0 {
            RatioBand::Good
        } else if value >= 0.9 {
            RatioBand::Caution
        } else {
            RatioBand::Poor
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            RatioBand::Good => Palette {
                background: "#f0fdf4",
                foreground: "#16a34a",
            },
            RatioBand::Caution => Palette {
                background: "#fffbeb",
                foreground: "#d97706",
            },
            RatioBand::Poor => Palette {
                background: "#fef2f2",
                foreground: "#dc2626",
            },
        }
    }
}

/// A performance ratio; `value` is `None` when it cannot be computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ratio {
    pub value: Option<f64>,
}

impl Ratio {
    /// `numerator / denominator` of two amounts.
    ///
    /// Undefined when either side does not parse or the denominator is zero.
    pub fn of(numerator: &str, denominator: &str) -> Ratio {
        let value = match (parse_amount(numerator), parse_amount(denominator)) {
            (Some(n), Some(d)) if d != 0.0 => Some(n / d),
            _ => None,
        };
        Ratio { value }
    }

    pub fn band(&self) -> Option<RatioBand> {
        self.value.map(RatioBand::of)
    }

    pub fn display(&self) -> String {
        match self.value {
            Some(v) => format!("{v:.2}"),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn palette(&self) -> Palette {
        self.band().map_or(NEUTRAL, RatioBand::palette)
    }
}

/// Cost performance index: earned value over actual resource spent.
pub fn cost_performance(report: &ProjectReport) -> Ratio {
    Ratio::of(&report.earned_value, &report.actual_spent)
}

/// Cash variance: invoices submitted over total expense to date.
pub fn cash_variance(report: &ProjectReport) -> Ratio {
    Ratio::of(&report.invoice_submitted, &report.external_actual_spent)
}

/// Overall progress as a whole percentage clamped to 0..=100.
pub fn progress_percent(text: &str) -> u8 {
    let clamped = parse_int(text).unwrap_or(0).clamp(0, 100);
    u8::try_from(clamped).unwrap_or(100)
}

/// Bar colour for an overall progress percentage.
pub fn progress_color(percent: u8) -> &'static str {
    if percent < 30 {
        "#f87171"
    } else if percent < 70 {
        "#fbbf24"
    } else {
        "#34d399"
    }
}

/// Values offered for the contract status field.
pub const CONTRACT_STATUSES: [&str; 4] = ["Signed", "Pending", "LOA Issued", "Awaited"];

/// Values offered for the budget status field.
pub const BUDGET_STATUSES: [&str; 2] = ["Approved", "Pending"];

pub fn contract_status_palette(status: &str) -> Palette {
    match status {
        "Signed" => Palette {
            background: "#dcfce7",
            foreground: "#166534",
        },
        "Pending" => Palette {
            background: "#fef9c3",
            foreground: "#854d0e",
        },
        "LOA Issued" => Palette {
            background: "#dbeafe",
            foreground: "#1e40af",
        },
        "Awaited" => Palette {
            background: "#fee2e2",
            foreground: "#991b1b",
        },
        _ => NEUTRAL,
    }
}

pub fn budget_status_palette(status: &str) -> Palette {
    if status == "Approved" {
        Palette {
            background: "#dcfce7",
            foreground: "#166534",
        }
    } else {
        Palette {
            background: "#fef9c3",
            foreground: "#854d0e",
        }
    }
}

/// Project code, name and client joined for the page header.
pub fn header_title(report: &ProjectReport) -> String {
    let parts: Vec<&str> = [&report.project_code, &report.project_name, &report.client]
        .into_iter()
        .map(String::as_str)
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        "Untitled Project".to_string()
    } else {
        parts.join(" \u{b7} ")
    }
}

/// Every derived value of a report, computed in one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardSummary {
    pub title: String,
    pub progress: u8,
    pub stage_status: Option<StageStatus>,
    pub balance: Balance,
    pub cost_performance: Ratio,
    pub cash_variance: Ratio,
}

pub fn summarize(report: &ProjectReport) -> DashboardSummary {
    DashboardSummary {
        title: header_title(report),
        progress: progress_percent(&report.progress_pct),
        stage_status: stage_status(&report.stage_planned_pct, &report.stage_actual_pct),
        balance: balance(&report.available_budget, &report.actual_spent),
        cost_performance: cost_performance(report),
        cash_variance: cash_variance(report),
    }
}
