use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Column the view is ordered by.
///
/// `CancellationDate` is virtual: it is computed from the contract date and
/// period rather than read from the cached string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    PhoneNumber,
    ContractDate,
    Carrier,
    ContractPeriod,
    CancellationDate,
    Owner,
    User,
    HasBullet,
    Notes,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PhoneNumber => "phoneNumber",
            Self::ContractDate => "contractDate",
            Self::Carrier => "carrier",
            Self::ContractPeriod => "contractPeriod",
            Self::CancellationDate => "cancellationDate",
            Self::Owner => "owner",
            Self::User => "user",
            Self::HasBullet => "hasBullet",
            Self::Notes => "notes",
        }
    }
}

impl FromStr for SortField {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phoneNumber" => Ok(Self::PhoneNumber),
            "contractDate" => Ok(Self::ContractDate),
            "carrier" => Ok(Self::Carrier),
            "contractPeriod" => Ok(Self::ContractPeriod),
            "cancellationDate" => Ok(Self::CancellationDate),
            "owner" => Ok(Self::Owner),
            "user" => Ok(Self::User),
            "hasBullet" => Ok(Self::HasBullet),
            "notes" => Ok(Self::Notes),
            other => Err(ProtocolError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ProtocolError::UnknownSortDirection(other.to_string())),
        }
    }
}

/// Active sort: one field, one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::ContractDate,
            direction: SortDirection::Asc,
        }
    }
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Column-header click: the active field flips direction, any other
    /// field becomes active in ascending order.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }
}

/// Flag filter. There is deliberately no "unflagged only" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagFilter {
    #[default]
    Any,
    OnlyFlagged,
}

impl FromStr for FlagFilter {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(Self::Any),
            "true" => Ok(Self::OnlyFlagged),
            other => Err(ProtocolError::UnknownFlagFilter(other.to_string())),
        }
    }
}

/// Equality filters. Empty strings match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub carrier: String,
    pub owner: String,
    pub user: String,
    pub flag: FlagFilter,
}

/// Query-string form of a view request, as sent by the presentation layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub search: String,
    pub carrier: String,
    pub owner: String,
    pub user: String,
    pub flag: String,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl ViewQuery {
    pub fn filter_spec(&self) -> Result<FilterSpec, ProtocolError> {
        Ok(FilterSpec {
            carrier: self.carrier.clone(),
            owner: self.owner.clone(),
            user: self.user.clone(),
            flag: self.flag.parse()?,
        })
    }

    /// Resolve the requested sort, falling back to `fallback` for the parts
    /// the query leaves out.
    pub fn sort_spec(&self, fallback: SortSpec) -> Result<SortSpec, ProtocolError> {
        let field = match self.sort.as_deref() {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => fallback.field,
        };
        let direction = match self.direction.as_deref() {
            Some(raw) if !raw.is_empty() => raw.parse()?,
            _ => fallback.direction,
        };
        Ok(SortSpec { field, direction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_active_field_and_resets_new_field() {
        let mut spec = SortSpec::default();
        assert_eq!(spec.field, SortField::ContractDate);

        spec.toggle(SortField::ContractDate);
        assert_eq!(spec.direction, SortDirection::Desc);

        spec.toggle(SortField::Carrier);
        assert_eq!(spec, SortSpec::new(SortField::Carrier, SortDirection::Asc));
    }

    #[test]
    fn view_query_uses_fallback_sort() {
        let query = ViewQuery {
            sort: Some("contractPeriod".into()),
            ..Default::default()
        };
        let spec = query
            .sort_spec(SortSpec::new(SortField::Notes, SortDirection::Desc))
            .unwrap();
        assert_eq!(spec.field, SortField::ContractPeriod);
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn flag_filter_accepts_only_empty_or_true() {
        assert_eq!("".parse::<FlagFilter>().unwrap(), FlagFilter::Any);
        assert_eq!("true".parse::<FlagFilter>().unwrap(), FlagFilter::OnlyFlagged);
        assert!("false".parse::<FlagFilter>().is_err());
    }

    #[test]
    fn rejects_unknown_sort_field() {
        let query = ViewQuery {
            sort: Some("price".into()),
            ..Default::default()
        };
        assert_eq!(
            query.sort_spec(SortSpec::default()),
            Err(ProtocolError::UnknownSortField("price".into()))
        );
    }
}
