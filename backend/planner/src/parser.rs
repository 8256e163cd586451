//! Turns the model's JSON text into a question table.
//!
//! Parsing is all-or-nothing: either every element becomes a record or the
//! whole response is rejected.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use esprobe_core::{EsprobeError, QuestionTable, Record, Result, Section, QUESTIONS_PER_SECTION};

/// One element of the model's JSON array. Unknown keys are ignored.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(rename = "セクション")]
    section: String,
    #[serde(rename = "メイン質問")]
    main_question: String,
    #[serde(rename = "深掘り質問")]
    probe_question: String,
    #[serde(rename = "評価の着眼点")]
    evaluation_criteria: String,
}

impl From<RawRecord> for Record {
    fn from(raw: RawRecord) -> Self {
        Record::generated(
            raw.section,
            raw.main_question,
            raw.probe_question,
            raw.evaluation_criteria,
        )
    }
}

/// Parse raw response text as a JSON array of question objects.
pub fn parse_response(text: &str) -> Result<QuestionTable> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| EsprobeError::Parse(format!("response is not valid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(EsprobeError::Parse(format!(
            "expected a JSON array, got {}",
            kind_of(&value)
        )));
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(EsprobeError::Parse(format!(
                    "element {i} is {}, expected an object",
                    kind_of(&item)
                )));
            }
            serde_json::from_value::<RawRecord>(item)
                .map(Record::from)
                .map_err(|e| EsprobeError::Parse(format!("element {i}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuestionTable::from_records(records))
}

/// Check that the table uses only the five known sections, three rows each.
pub fn check_layout(table: &QuestionTable) -> Result<()> {
    let mut counts: HashMap<Section, usize> = HashMap::new();
    for (i, record) in table.records().iter().enumerate() {
        let section = record.known_section().ok_or_else(|| {
            EsprobeError::Parse(format!("row {i} has unknown section {:?}", record.section))
        })?;
        *counts.entry(section).or_default() += 1;
    }

    for section in Section::ALL {
        let count = counts.get(&section).copied().unwrap_or(0);
        if count != QUESTIONS_PER_SECTION {
            return Err(EsprobeError::Parse(format!(
                "section {section} has {count} questions, expected {QUESTIONS_PER_SECTION}"
            )));
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
