//! The project report document.
//!
//! [`ProjectReport`] is the single document the dashboard edits and stores:
//! free-text scalar fields plus three row lists. Edits never mutate a report
//! in place; the `with_*` methods return an edited copy.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of blank rows each collection starts with.
pub const DEFAULT_ROW_COUNT: usize = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramRow {
    pub stage: String,
    pub baseline: String,
    pub actual: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionRow {
    pub action: String,
    pub owner: String,
    pub date: String,
}

/// The project report document
///
/// A flat record of string fields plus three ordered row collections. Every
/// field is free text: amounts, percentages and dates are kept exactly as
/// typed and only interpreted by the functions in [`crate::metrics`].
///
/// Keys found in storage that are not fields of the report are kept in
/// `extra` so that a save writes them back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectReport {
    pub project_code: String,
    pub project_name: String,
    pub client: String,
    pub report_date: String,
    pub key_personnel: String,
    pub subconsultants: String,
    pub contract_status: String,
    pub contract_value: String,
    pub budget_status: String,
    pub internal_budget: String,
    pub external_budget: String,
    pub available_budget: String,
    pub actual_spent: String,
    pub earned_value: String,
    pub invoice_submitted: String,
    pub external_actual_spent: String,
    pub project_status: String,
    pub progress_pct: String,
    pub stage_planned_pct: String,
    pub stage_actual_pct: String,
    pub target_invoice: String,
    pub invoice_due_date: String,
    pub client_payments: String,
    pub subs_payments: String,
    pub program_rows: Vec<ProgramRow>,
    pub potential_variations: String,
    pub critical_issues: String,
    pub current_actions: Vec<ActionRow>,
    pub next_actions: Vec<ActionRow>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Today's date in UTC as `YYYY-MM-DD`.
pub fn default_report_date() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

impl Default for ProjectReport {
    fn default() -> Self {
        ProjectReport {
            project_code: String::new(),
            project_name: String::new(),
            client: String::new(),
            report_date: default_report_date(),
            key_personnel: String::new(),
            subconsultants: String::new(),
            contract_status: String::new(),
            contract_value: String::new(),
            budget_status: String::new(),
            internal_budget: String::new(),
            external_budget: String::new(),
            available_budget: String::new(),
            actual_spent: String::new(),
            earned_value: String::new(),
            invoice_submitted: String::new(),
            external_actual_spent: String::new(),
            project_status: String::new(),
            progress_pct: String::new(),
            stage_planned_pct: String::new(),
            stage_actual_pct: String::new(),
            target_invoice: String::new(),
            invoice_due_date: String::new(),
            client_payments: String::new(),
            subs_payments: String::new(),
            program_rows: vec![ProgramRow::default(); DEFAULT_ROW_COUNT],
            potential_variations: String::new(),
            critical_issues: String::new(),
            current_actions: vec![ActionRow::default(); DEFAULT_ROW_COUNT],
            next_actions: vec![ActionRow::default(); DEFAULT_ROW_COUNT],
            extra: BTreeMap::new(),
        }
    }
}

/// Scalar fields of the report, named by their wire key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    ProjectCode,
    ProjectName,
    Client,
    ReportDate,
    KeyPersonnel,
    Subconsultants,
    ContractStatus,
    ContractValue,
    BudgetStatus,
    InternalBudget,
    ExternalBudget,
    AvailableBudget,
    ActualSpent,
    EarnedValue,
    InvoiceSubmitted,
    ExternalActualSpent,
    ProjectStatus,
    ProgressPct,
    StagePlannedPct,
    StageActualPct,
    TargetInvoice,
    InvoiceDueDate,
    ClientPayments,
    SubsPayments,
    PotentialVariations,
    CriticalIssues,
}

impl Field {
    pub const ALL: [Field; 26] = [
        Field::ProjectCode,
        Field::ProjectName,
        Field::Client,
        Field::ReportDate,
        Field::KeyPersonnel,
        Field::Subconsultants,
        Field::ContractStatus,
        Field::ContractValue,
        Field::BudgetStatus,
        Field::InternalBudget,
        Field::ExternalBudget,
        Field::AvailableBudget,
        Field::ActualSpent,
        Field::EarnedValue,
        Field::InvoiceSubmitted,
        Field::ExternalActualSpent,
        Field::ProjectStatus,
        Field::ProgressPct,
        Field::StagePlannedPct,
        Field::StageActualPct,
        Field::TargetInvoice,
        Field::InvoiceDueDate,
        Field::ClientPayments,
        Field::SubsPayments,
        Field::PotentialVariations,
        Field::CriticalIssues,
    ];

    /// Key used for this field in storage and on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            Field::ProjectCode => "projectCode",
            Field::ProjectName => "projectName",
            Field::Client => "client",
            Field::ReportDate => "reportDate",
            Field::KeyPersonnel => "keyPersonnel",
            Field::Subconsultants => "subconsultants",
            Field::ContractStatus => "contractStatus",
            Field::ContractValue => "contractValue",
            Field::BudgetStatus => "budgetStatus",
            Field::InternalBudget => "internalBudget",
            Field::ExternalBudget => "externalBudget",
            Field::AvailableBudget => "availableBudget",
            Field::ActualSpent => "actualSpent",
            Field::EarnedValue => "earnedValue",
            Field::InvoiceSubmitted => "invoiceSubmitted",
            Field::ExternalActualSpent => "externalActualSpent",
            Field::ProjectStatus => "projectStatus",
            Field::ProgressPct => "progressPct",
            Field::StagePlannedPct => "stagePlannedPct",
            Field::StageActualPct => "stageActualPct",
            Field::TargetInvoice => "targetInvoice",
            Field::InvoiceDueDate => "invoiceDueDate",
            Field::ClientPayments => "clientPayments",
            Field::SubsPayments => "subsPayments",
            Field::PotentialVariations => "potentialVariations",
            Field::CriticalIssues => "criticalIssues",
        }
    }

    /// Human readable label shown next to the field.
    pub fn label(self) -> &'static str {
        match self {
            Field::ProjectCode => "Project Code",
            Field::ProjectName => "Project Name",
            Field::Client => "Client",
            Field::ReportDate => "Report Date",
            Field::KeyPersonnel => "Key Personnel / Project Lead",
            Field::Subconsultants => "Subconsultants",
            Field::ContractStatus => "Contract Status",
            Field::ContractValue => "Contract Value",
            Field::BudgetStatus => "Budget Status",
            Field::InternalBudget => "Internal Fee",
            Field::ExternalBudget => "External Fees",
            Field::AvailableBudget => "Available Resource Budget To-Date",
            Field::ActualSpent => "Actual Resource Spent To-Date",
            Field::EarnedValue => "Earned Value",
            Field::InvoiceSubmitted => "Value of Invoice Submitted To-Date",
            Field::ExternalActualSpent => "Total Expense To-Date (Internal + % External)",
            Field::ProjectStatus => "Current Stage & Status",
            Field::ProgressPct => "Overall Progress",
            Field::StagePlannedPct => "Current Stage Planned Progress %",
            Field::StageActualPct => "Current Stage Actual Progress %",
            Field::TargetInvoice => "Target Invoice Milestone & Value",
            Field::InvoiceDueDate => "Invoice Due Date",
            Field::ClientPayments => "Client Payments",
            Field::SubsPayments => "Sub-Consultant Payments",
            Field::PotentialVariations => "Potential Variations - Plan of Action",
            Field::CriticalIssues => "Critical Issues & Risks",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown field: {0}")]
pub struct UnknownName(pub String);

impl FromStr for Field {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.wire_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

/// The three repeated-row collections of the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    ProgramRows,
    CurrentActions,
    NextActions,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::ProgramRows,
        Collection::CurrentActions,
        Collection::NextActions,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            Collection::ProgramRows => "programRows",
            Collection::CurrentActions => "currentActions",
            Collection::NextActions => "nextActions",
        }
    }

    /// Columns of a row in this collection, in display order.
    pub fn columns(self) -> &'static [RowField] {
        match self {
            Collection::ProgramRows => &[RowField::Stage, RowField::Baseline, RowField::Actual],
            Collection::CurrentActions | Collection::NextActions => {
                &[RowField::Action, RowField::Owner, RowField::Date]
            }
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Collection {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "programrows" | "program" => Ok(Collection::ProgramRows),
            "currentactions" | "current" => Ok(Collection::CurrentActions),
            "nextactions" | "next" => Ok(Collection::NextActions),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// A column of a collection row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowField {
    Stage,
    Baseline,
    Actual,
    Action,
    Owner,
    Date,
}

impl RowField {
    pub fn wire_name(self) -> &'static str {
        match self {
            RowField::Stage => "stage",
            RowField::Baseline => "baseline",
            RowField::Actual => "actual",
            RowField::Action => "action",
            RowField::Owner => "owner",
            RowField::Date => "date",
        }
    }
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for RowField {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stage" => Ok(RowField::Stage),
            "baseline" => Ok(RowField::Baseline),
            "actual" => Ok(RowField::Actual),
            "action" => Ok(RowField::Action),
            "owner" => Ok(RowField::Owner),
            "date" => Ok(RowField::Date),
            _ => Err(UnknownName(s.to_string())),
        }
    }
}

/// Rejected row edits. The document is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("row {index} is out of range for {collection} ({len} rows)")]
    RowOutOfRange {
        collection: Collection,
        index: usize,
        len: usize,
    },
    #[error("{field} is not a column of {collection}")]
    FieldNotInCollection {
        collection: Collection,
        field: RowField,
    },
}

/// Shared behaviour of the two row shapes.
pub trait RowRecord: Clone + Default {
    fn get(&self, field: RowField) -> Option<&str>;
    fn get_mut(&mut self, field: RowField) -> Option<&mut String>;
}

impl RowRecord for ProgramRow {
    fn get(&self, field: RowField) -> Option<&str> {
        match field {
            RowField::Stage => Some(&self.stage),
            RowField::Baseline => Some(&self.baseline),
            RowField::Actual => Some(&self.actual),
            _ => None,
        }
    }

    fn get_mut(&mut self, field: RowField) -> Option<&mut String> {
        match field {
            RowField::Stage => Some(&mut self.stage),
            RowField::Baseline => Some(&mut self.baseline),
            RowField::Actual => Some(&mut self.actual),
            _ => None,
        }
    }
}

impl RowRecord for ActionRow {
    fn get(&self, field: RowField) -> Option<&str> {
        match field {
            RowField::Action => Some(&self.action),
            RowField::Owner => Some(&self.owner),
            RowField::Date => Some(&self.date),
            _ => None,
        }
    }

    fn get_mut(&mut self, field: RowField) -> Option<&mut String> {
        match field {
            RowField::Action => Some(&mut self.action),
            RowField::Owner => Some(&mut self.owner),
            RowField::Date => Some(&mut self.date),
            _ => None,
        }
    }
}

fn set_row_field<R: RowRecord>(
    rows: &mut [R],
    collection: Collection,
    index: usize,
    field: RowField,
    value: String,
) -> Result<(), EditError> {
    let len = rows.len();
    let row = rows.get_mut(index).ok_or(EditError::RowOutOfRange {
        collection,
        index,
        len,
    })?;
    let slot = row
        .get_mut(field)
        .ok_or(EditError::FieldNotInCollection { collection, field })?;
    *slot = value;
    Ok(())
}

fn remove_row<R>(rows: &mut Vec<R>, collection: Collection, index: usize) -> Result<(), EditError> {
    if index >= rows.len() {
        return Err(EditError::RowOutOfRange {
            collection,
            index,
            len: rows.len(),
        });
    }
    rows.remove(index);
    Ok(())
}

impl ProjectReport {
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::ProjectCode => &self.project_code,
            Field::ProjectName => &self.project_name,
            Field::Client => &self.client,
            Field::ReportDate => &self.report_date,
            Field::KeyPersonnel => &self.key_personnel,
            Field::Subconsultants => &self.subconsultants,
            Field::ContractStatus => &self.contract_status,
            Field::ContractValue => &self.contract_value,
            Field::BudgetStatus => &self.budget_status,
            Field::InternalBudget => &self.internal_budget,
            Field::ExternalBudget => &self.external_budget,
            Field::AvailableBudget => &self.available_budget,
            Field::ActualSpent => &self.actual_spent,
            Field::EarnedValue => &self.earned_value,
            Field::InvoiceSubmitted => &self.invoice_submitted,
            Field::ExternalActualSpent => &self.external_actual_spent,
            Field::ProjectStatus => &self.project_status,
            Field::ProgressPct => &self.progress_pct,
            Field::StagePlannedPct => &self.stage_planned_pct,
            Field::StageActualPct => &self.stage_actual_pct,
            Field::TargetInvoice => &self.target_invoice,
            Field::InvoiceDueDate => &self.invoice_due_date,
            Field::ClientPayments => &self.client_payments,
            Field::SubsPayments => &self.subs_payments,
            Field::PotentialVariations => &self.potential_variations,
            Field::CriticalIssues => &self.critical_issues,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::ProjectCode => &mut self.project_code,
            Field::ProjectName => &mut self.project_name,
            Field::Client => &mut self.client,
            Field::ReportDate => &mut self.report_date,
            Field::KeyPersonnel => &mut self.key_personnel,
            Field::Subconsultants => &mut self.subconsultants,
            Field::ContractStatus => &mut self.contract_status,
            Field::ContractValue => &mut self.contract_value,
            Field::BudgetStatus => &mut self.budget_status,
            Field::InternalBudget => &mut self.internal_budget,
            Field::ExternalBudget => &mut self.external_budget,
            Field::AvailableBudget => &mut self.available_budget,
            Field::ActualSpent => &mut self.actual_spent,
            Field::EarnedValue => &mut self.earned_value,
            Field::InvoiceSubmitted => &mut self.invoice_submitted,
            Field::ExternalActualSpent => &mut self.external_actual_spent,
            Field::ProjectStatus => &mut self.project_status,
            Field::ProgressPct => &mut self.progress_pct,
            Field::StagePlannedPct => &mut self.stage_planned_pct,
            Field::StageActualPct => &mut self.stage_actual_pct,
            Field::TargetInvoice => &mut self.target_invoice,
            Field::InvoiceDueDate => &mut self.invoice_due_date,
            Field::ClientPayments => &mut self.client_payments,
            Field::SubsPayments => &mut self.subs_payments,
            Field::PotentialVariations => &mut self.potential_variations,
            Field::CriticalIssues => &mut self.critical_issues,
        }
    }

    pub fn row_count(&self, collection: Collection) -> usize {
        match collection {
            Collection::ProgramRows => self.program_rows.len(),
            Collection::CurrentActions => self.current_actions.len(),
            Collection::NextActions => self.next_actions.len(),
        }
    }

    /// Value of one cell of a collection, if the row and column exist.
    pub fn row_value(&self, collection: Collection, index: usize, field: RowField) -> Option<&str> {
        match collection {
            Collection::ProgramRows => self.program_rows.get(index)?.get(field),
            Collection::CurrentActions => self.current_actions.get(index)?.get(field),
            Collection::NextActions => self.next_actions.get(index)?.get(field),
        }
    }

    /// Returns a copy of the report with one scalar field replaced.
    pub fn with_field(&self, field: Field, value: impl Into<String>) -> ProjectReport {
        let mut next = self.clone();
        *next.field_mut(field) = value.into();
        next
    }

    /// Returns a copy of the report with one cell of a row replaced.
    ///
    /// # Errors
    /// * `RowOutOfRange` if `index` is past the end of the collection
    /// * `FieldNotInCollection` if `field` is not a column of the collection
    pub fn with_row_field(
        &self,
        collection: Collection,
        index: usize,
        field: RowField,
        value: impl Into<String>,
    ) -> Result<ProjectReport, EditError> {
        let mut next = self.clone();
        let value = value.into();
        match collection {
            Collection::ProgramRows => {
                set_row_field(&mut next.program_rows, collection, index, field, value)?
            }
            Collection::CurrentActions => {
                set_row_field(&mut next.current_actions, collection, index, field, value)?
            }
            Collection::NextActions => {
                set_row_field(&mut next.next_actions, collection, index, field, value)?
            }
        }
        Ok(next)
    }

    /// Returns a copy of the report with a blank row appended to `collection`.
    pub fn with_row_added(&self, collection: Collection) -> ProjectReport {
        let mut next = self.clone();
        match collection {
            Collection::ProgramRows => next.program_rows.push(ProgramRow::default()),
            Collection::CurrentActions => next.current_actions.push(ActionRow::default()),
            Collection::NextActions => next.next_actions.push(ActionRow::default()),
        }
        next
    }

    /// Returns a copy of the report without the row at `index`.
    ///
    /// # Errors
    /// * `RowOutOfRange` if `index` is past the end of the collection
    pub fn with_row_removed(
        &self,
        collection: Collection,
        index: usize,
    ) -> Result<ProjectReport, EditError> {
        let mut next = self.clone();
        match collection {
            Collection::ProgramRows => remove_row(&mut next.program_rows, collection, index)?,
            Collection::CurrentActions => remove_row(&mut next.current_actions, collection, index)?,
            Collection::NextActions => remove_row(&mut next.next_actions, collection, index)?,
        }
        Ok(next)
    }
}
