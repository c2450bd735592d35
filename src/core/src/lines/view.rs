//! Derived-view engine: cancellation dates, expiry, filtering and sorting.
//!
//! Everything here is a pure function of the records and the request; the
//! record store is never mutated.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{Local, Months, NaiveDate};
use linebook_protocol::{
    DerivedFields, FilterChoices, FilterSpec, FlagFilter, LineRecord, LineView, SortDirection,
    SortField, SortSpec, DISPLAY_DATE_FORMAT, ISO_DATE_FORMAT,
};

/// Inputs for one projection of the record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewRequest {
    pub search: String,
    pub filter: FilterSpec,
    pub sort: SortSpec,
}

/// Today's date in local time.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Add calendar months. A day that does not exist in the target month is
/// clamped to that month's last day (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// `contract_date + contract_period` months, when both are present.
pub fn cancellation_date(record: &LineRecord) -> Option<NaiveDate> {
    let start = record.contract_date?;
    let months = record.contract_period?;
    add_months(start, months)
}

/// A cancellation date strictly before `today` has passed.
pub fn is_expired(cancellation: Option<NaiveDate>, today: NaiveDate) -> bool {
    matches!(cancellation, Some(date) if date < today)
}

pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn derive(record: &LineRecord, today: NaiveDate) -> DerivedFields {
    let cancellation = cancellation_date(record);
    DerivedFields {
        cancellation_date: cancellation,
        cancellation_date_text: cancellation.map(format_display_date).unwrap_or_default(),
        contract_date_text: record
            .contract_date
            .map(format_display_date)
            .unwrap_or_default(),
        expired: is_expired(cancellation, today),
    }
}

/// Case-insensitive substring search over every non-boolean field.
///
/// `needle` must already be lowercased. Empty field values never match; an
/// empty needle matches everything.
pub fn matches_search(record: &LineRecord, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let contract_date = record
        .contract_date
        .map(|d| d.format(ISO_DATE_FORMAT).to_string())
        .unwrap_or_default();
    let contract_period = record
        .contract_period
        .map(|m| m.to_string())
        .unwrap_or_default();

    [
        record.id.as_str(),
        record.phone_number.as_str(),
        contract_date.as_str(),
        record.carrier.as_str(),
        contract_period.as_str(),
        record.cancellation_date.as_str(),
        record.owner.as_str(),
        record.user.as_str(),
        record.notes.as_str(),
    ]
    .iter()
    .any(|value| !value.is_empty() && value.to_lowercase().contains(needle))
}

pub fn matches_filter(record: &LineRecord, filter: &FilterSpec) -> bool {
    let field_matches = |wanted: &str, actual: &str| wanted.is_empty() || wanted == actual;
    let flag_matches = match filter.flag {
        FlagFilter::Any => true,
        FlagFilter::OnlyFlagged => record.has_bullet,
    };
    field_matches(&filter.carrier, &record.carrier)
        && field_matches(&filter.owner, &record.owner)
        && field_matches(&filter.user, &record.user)
        && flag_matches
}

/// Ordering of two records under `spec`.
///
/// Records without a computable cancellation date sort last in both
/// directions when ordering by that column.
pub fn compare_records(a: &LineRecord, b: &LineRecord, spec: SortSpec) -> Ordering {
    let directed = |ord: Ordering| match spec.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    };
    let text = |x: &str, y: &str| x.to_lowercase().cmp(&y.to_lowercase());

    match spec.field {
        SortField::CancellationDate => match (cancellation_date(a), cancellation_date(b)) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        },
        // `None` orders before every date.
        SortField::ContractDate => directed(a.contract_date.cmp(&b.contract_date)),
        SortField::ContractPeriod => directed(
            a.contract_period
                .unwrap_or(0)
                .cmp(&b.contract_period.unwrap_or(0)),
        ),
        SortField::HasBullet => directed(b.has_bullet.cmp(&a.has_bullet)),
        SortField::PhoneNumber => directed(text(&a.phone_number, &b.phone_number)),
        SortField::Carrier => directed(text(&a.carrier, &b.carrier)),
        SortField::Owner => directed(text(&a.owner, &b.owner)),
        SortField::User => directed(text(&a.user, &b.user)),
        SortField::Notes => directed(text(&a.notes, &b.notes)),
    }
}

/// Filter, then stably sort, the records for display.
pub fn select<'a>(records: &'a [LineRecord], request: &ViewRequest) -> Vec<&'a LineRecord> {
    let needle = request.search.to_lowercase();
    let mut selected: Vec<&LineRecord> = records
        .iter()
        .filter(|r| matches_search(r, &needle) && matches_filter(r, &request.filter))
        .collect();
    selected.sort_by(|a, b| compare_records(a, b, request.sort));
    selected
}

/// The full projection: selected records with derived fields attached.
pub fn build_view(records: &[LineRecord], request: &ViewRequest, today: NaiveDate) -> Vec<LineView> {
    select(records, request)
        .into_iter()
        .map(|record| LineView {
            record: record.clone(),
            derived: derive(record, today),
        })
        .collect()
}

/// Distinct non-empty carriers, owners and users found on records, sorted.
pub fn filter_choices(records: &[LineRecord]) -> FilterChoices {
    FilterChoices {
        carriers: distinct_values(records, |r| r.carrier.as_str()),
        owners: distinct_values(records, |r| r.owner.as_str()),
        users: distinct_values(records, |r| r.user.as_str()),
    }
}

fn distinct_values(records: &[LineRecord], pick: fn(&LineRecord) -> &str) -> Vec<String> {
    records
        .iter()
        .map(pick)
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
