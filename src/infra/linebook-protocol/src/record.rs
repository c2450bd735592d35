use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Role;

/// Storage format for contract dates (`<input type="date">` style).
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// One tracked mobile phone contract line.
///
/// The serialized shape is the persisted `mobileLines` element: camelCase
/// keys, dates as `YYYY-MM-DD` (or `""`), the contract period as a decimal
/// string (or `""`). Missing keys fall back to their empty defaults so
/// records written before a field existed still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    /// Opaque identifier. Empty until the record is first saved.
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone_number: String,
    #[serde(default, with = "legacy_date")]
    pub contract_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub carrier: String,
    /// Contract length in months.
    #[serde(default, with = "legacy_period")]
    pub contract_period: Option<u32>,
    /// Cached display string. The authoritative value is always recomputed
    /// from `contract_date + contract_period`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub cancellation_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub owner: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub user: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub has_bullet: bool,
}

impl LineRecord {
    /// True until the record has been assigned an id by the store.
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    /// The field a pool role selects.
    pub fn role_value(&self, role: Role) -> &str {
        match role {
            Role::Carrier => &self.carrier,
            Role::Owner => &self.owner,
            Role::User => &self.user,
        }
    }
}

/// Parse a stored contract date, tolerating surrounding whitespace.
pub fn parse_contract_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT).ok()
}

/// Numbers keep their decimal text; `null` and other non-strings read as `""`.
fn lenient_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let raw = serde_json::Value::deserialize(d)?;
    Ok(match raw {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// `null` and non-boolean values read as `false`.
fn lenient_bool<'de, D: serde::Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = serde_json::Value::deserialize(d)?;
    Ok(raw.as_bool().unwrap_or(false))
}

mod legacy_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use super::{parse_contract_date, ISO_DATE_FORMAT};

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.collect_str(&date.format(ISO_DATE_FORMAT)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Value::deserialize(d)?;
        Ok(raw.as_str().and_then(parse_contract_date))
    }
}

mod legacy_period {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(months) => s.collect_str(months),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let raw = Value::deserialize(d)?;
        let months = match raw {
            Value::String(s) => s.trim().parse::<u32>().ok(),
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            _ => None,
        };
        Ok(months)
    }
}
