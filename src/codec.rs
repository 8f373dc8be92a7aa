//! Conversion between the report and its key/value storage form.
//!
//! Storage holds one row per top-level field. String fields are stored as
//! typed; row collections are stored as their JSON text. Reading reverses
//! this by attempting a JSON parse on every value and falling back to the
//! raw text.

use crate::report::{ActionRow, Collection, ProgramRow, ProjectReport};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// Key of the header row in the backing range. Never part of a document.
pub const HEADER_KEY: &str = "key";

/// Flat key/value mapping returned by a gateway read.
pub type GatewayRows = BTreeMap<String, String>;

/// How stored text is turned back into scalar field values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Scalar fields keep their stored text unless it is a JSON string
    /// literal, so `"007"` or `"1.50"` come back exactly as typed.
    #[default]
    Preserve,
    /// Numbers and booleans are re-rendered from their parsed value, the way
    /// the first dashboard did (`"1.50"` becomes `"1.5"`).
    Legacy,
}

/// Encodes a report as the JSON object sent with a gateway write.
pub fn to_wire(report: &ProjectReport) -> Result<Map<String, Value>, serde_json::Error> {
    match serde_json::to_value(report)? {
        Value::Object(object) => Ok(object),
        other => Err(serde::ser::Error::custom(format!(
            "report serialized to a non-object value: {other}"
        ))),
    }
}

/// Storage text for one wire value: strings as-is, everything else as JSON.
pub fn encode_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Range rows (`[key, value]`) for a wire object, in key order.
pub fn to_range_rows(object: &Map<String, Value>) -> Vec<Vec<String>> {
    object
        .iter()
        .map(|(key, value)| vec![key.clone(), encode_cell(value)])
        .collect()
}

/// Key/value mapping from range rows.
///
/// The header row and rows without a value cell are skipped; a later row
/// with the same key wins.
pub fn from_range_rows(rows: &[Vec<String>]) -> GatewayRows {
    let mut data = GatewayRows::new();
    for row in rows {
        if let [key, value, ..] = row.as_slice() {
            if key != HEADER_KEY {
                data.insert(key.clone(), value.clone());
            }
        }
    }
    data
}

fn js_number_text(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    match number.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.abs() >= 1e21 || f.abs() < 1e-6 => js_exponent_text(f),
        // Display already prints the shortest digits without an exponent
        Some(f) => f.to_string(),
        None => number.to_string(),
    }
}

// `1e+21`, `1.5e-7`: shortest mantissa, signed exponent
fn js_exponent_text(f: f64) -> String {
    let text = format!("{f:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}

fn decode_scalar(raw: &str, parsed: Option<Value>, policy: DecodePolicy) -> String {
    match (parsed, policy) {
        (Some(Value::String(s)), _) => s,
        (Some(Value::Number(n)), DecodePolicy::Legacy) => js_number_text(&n),
        (Some(Value::Bool(b)), DecodePolicy::Legacy) => b.to_string(),
        (Some(Value::Null), DecodePolicy::Legacy) => String::new(),
        _ => raw.to_string(),
    }
}

fn decode_collection(collection: Collection, parsed: Option<Value>) -> Option<Value> {
    let value = parsed?;
    let valid = match collection {
        Collection::ProgramRows => serde_json::from_value::<Vec<ProgramRow>>(value.clone()).is_ok(),
        Collection::CurrentActions | Collection::NextActions => {
            serde_json::from_value::<Vec<ActionRow>>(value.clone()).is_ok()
        }
    };
    valid.then_some(value)
}

enum Slot {
    Scalar,
    Rows,
    Extra,
}

/// Decodes gateway rows into a report, starting from the default document.
///
/// Fields absent from `rows` keep their defaults. A collection whose stored
/// text is not a list of rows of the right shape also keeps its default.
/// Keys that are not report fields end up in [`ProjectReport::extra`] as their
/// stored text.
pub fn decode_document(rows: &GatewayRows, policy: DecodePolicy) -> ProjectReport {
    let defaults = ProjectReport::default();
    let mut document = match to_wire(&defaults) {
        Ok(object) => object,
        Err(_) => return defaults,
    };

    for (key, raw) in rows {
        if key == HEADER_KEY {
            continue;
        }
        let parsed = serde_json::from_str::<Value>(raw).ok();
        let slot = match document.get(key) {
            Some(Value::String(_)) => Slot::Scalar,
            Some(Value::Array(_)) => Slot::Rows,
            _ => Slot::Extra,
        };
        match slot {
            Slot::Scalar => {
                document.insert(key.clone(), Value::String(decode_scalar(raw, parsed, policy)));
            }
            Slot::Rows => {
                let decoded = key
                    .parse::<Collection>()
                    .ok()
                    .and_then(|collection| decode_collection(collection, parsed));
                match decoded {
                    Some(value) => {
                        document.insert(key.clone(), value);
                    }
                    None => log::warn!("ignoring malformed stored rows for {key}"),
                }
            }
            // kept as stored text so the save writes back exactly what was read
            Slot::Extra => {
                document.insert(key.clone(), Value::String(raw.clone()));
            }
        }
    }

    match serde_json::from_value(Value::Object(document)) {
        Ok(report) => report,
        Err(err) => {
            log::warn!("stored document could not be decoded, using defaults: {err}");
            defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, &str)]) -> GatewayRows {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_mapping_decodes_to_defaults() {
        let report = decode_document(&GatewayRows::new(), DecodePolicy::Preserve);
        let defaults = ProjectReport::default();
        assert_eq!(report.program_rows, defaults.program_rows);
        assert_eq!(report.project_code, "");
        assert!(report.extra.is_empty());
    }

    #[test]
    fn json_strings_are_unwrapped_and_numbers_kept_as_typed() {
        let report = decode_document(
            &rows(&[("projectCode", "\"ABC\""), ("progressPct", "42")]),
            DecodePolicy::Preserve,
        );
        assert_eq!(report.project_code, "ABC");
        assert_eq!(report.progress_pct, "42");
        assert_eq!(report.client, "");
        assert_eq!(report.current_actions.len(), 3);
    }

    #[test]
    fn numeric_looking_text_survives_a_reload() {
        let report = decode_document(
            &rows(&[("projectCode", "007"), ("contractValue", "1.50"), ("client", "true")]),
            DecodePolicy::Preserve,
        );
        assert_eq!(report.project_code, "007");
        assert_eq!(report.contract_value, "1.50");
        assert_eq!(report.client, "true");
    }

    #[test]
    fn legacy_policy_rewrites_numbers() {
        let report = decode_document(
            &rows(&[
                ("progressPct", "42"),
                ("contractValue", "1.50"),
                ("actualSpent", "1e3"),
                ("projectCode", "007"),
            ]),
            DecodePolicy::Legacy,
        );
        assert_eq!(report.progress_pct, "42");
        assert_eq!(report.contract_value, "1.5");
        assert_eq!(report.actual_spent, "1000");
        // not valid JSON, so even the legacy reader keeps it
        assert_eq!(report.project_code, "007");
    }

    #[test]
    fn legacy_policy_uses_exponent_form_at_the_extremes() {
        let report = decode_document(
            &rows(&[
                ("contractValue", "1e21"),
                ("internalBudget", "25000000000000000000000"),
                ("externalBudget", "-1e21"),
                ("earnedValue", "0.0000001"),
                ("actualSpent", "1.5e-7"),
                ("availableBudget", "0.000001"),
                ("invoiceSubmitted", "123456789012345680000"),
                ("clientPayments", "-0.0"),
            ]),
            DecodePolicy::Legacy,
        );
        assert_eq!(report.contract_value, "1e+21");
        assert_eq!(report.internal_budget, "2.5e+22");
        assert_eq!(report.external_budget, "-1e+21");
        assert_eq!(report.earned_value, "1e-7");
        assert_eq!(report.actual_spent, "1.5e-7");
        assert_eq!(report.available_budget, "0.000001");
        assert_eq!(report.invoice_submitted, "123456789012345680000");
        assert_eq!(report.client_payments, "0");
    }

    #[test]
    fn header_row_never_reaches_the_document() {
        let report = decode_document(
            &rows(&[("key", "value"), ("client", "Aldar")]),
            DecodePolicy::Preserve,
        );
        assert_eq!(report.client, "Aldar");
        assert!(!report.extra.contains_key(HEADER_KEY));

        let data = from_range_rows(&[
            vec!["key".to_string(), "value".to_string()],
            vec!["client".to_string(), "Aldar".to_string()],
            vec!["orphan".to_string()],
        ]);
        assert_eq!(data.len(), 1);
        assert_eq!(data["client"], "Aldar");
    }

    #[test]
    fn collections_decode_from_json_text() {
        let stored = r#"[{"stage":"Concept","baseline":"8 weeks","actual":"10 weeks"},{"stage":"Tender"}]"#;
        let report = decode_document(&rows(&[("programRows", stored)]), DecodePolicy::Preserve);
        assert_eq!(report.program_rows.len(), 2);
        assert_eq!(report.program_rows[0].actual, "10 weeks");
        assert_eq!(report.program_rows[1].stage, "Tender");
        assert_eq!(report.program_rows[1].baseline, "");
    }

    #[test]
    fn malformed_collection_keeps_default_rows() {
        let report = decode_document(
            &rows(&[("nextActions", "not json"), ("currentActions", "{\"action\":1}")]),
            DecodePolicy::Preserve,
        );
        assert_eq!(report.next_actions, ProjectReport::default().next_actions);
        assert_eq!(report.current_actions, ProjectReport::default().current_actions);
    }

    #[test]
    fn unknown_keys_are_carried_through_a_save() {
        let report = decode_document(
            &rows(&[
                ("legacyNote", "hello"),
                ("legacyList", "[1,2]"),
                ("legacyAmount", "1.50"),
                ("legacyBig", "1e3"),
                ("legacyObj", "{ \"a\": 1 }"),
            ]),
            DecodePolicy::Preserve,
        );
        assert_eq!(report.extra["legacyNote"], Value::String("hello".into()));

        let wire = to_wire(&report).unwrap();
        let stored = from_range_rows(&to_range_rows(&wire));
        assert_eq!(stored["legacyNote"], "hello");
        assert_eq!(stored["legacyList"], "[1,2]");
        assert_eq!(stored["legacyAmount"], "1.50");
        assert_eq!(stored["legacyBig"], "1e3");
        assert_eq!(stored["legacyObj"], "{ \"a\": 1 }");
    }

    #[test]
    fn cells_are_encoded_like_the_gateway_does() {
        assert_eq!(encode_cell(&Value::String("AED 1,000".into())), "AED 1,000");
        assert_eq!(encode_cell(&serde_json::json!([{"a": "b"}])), r#"[{"a":"b"}]"#);
        assert_eq!(encode_cell(&serde_json::json!(12)), "12");
    }
}
