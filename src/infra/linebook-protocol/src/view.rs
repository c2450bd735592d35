use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::LineRecord;

/// Display format for dates (ja-JP short form, e.g. `2024/3/15`).
pub const DISPLAY_DATE_FORMAT: &str = "%Y/%-m/%-d";

/// Fields computed from a record at view time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFields {
    pub cancellation_date: Option<NaiveDate>,
    pub cancellation_date_text: String,
    pub contract_date_text: String,
    pub expired: bool,
}

/// A record as shown in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub record: LineRecord,
    pub derived: DerivedFields,
}

/// Distinct values present on records, used to populate filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterChoices {
    pub carriers: Vec<String>,
    pub owners: Vec<String>,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub lines: Vec<LineView>,
    pub choices: FilterChoices,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolValue {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResponse {
    pub role: String,
    pub label: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneInput {
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneCheck {
    pub formatted: String,
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
