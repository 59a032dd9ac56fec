use chrono::{DateTime, Datelike, Months, TimeZone, Utc};

use super::order_status::OrderKind;

const ROMAN_MONTHS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

/// Roman numeral for a calendar month (1..=12)
pub fn to_roman(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| ROMAN_MONTHS.get(idx as usize).copied())
}

/// Leading four-digit sequence of a document number such as `0007/APU/SO/X/2024`
pub fn parse_sequence(document_no: &str) -> Option<u32> {
    let head = document_no.get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// Formats `NNNN/<prefix>/<SO|PO>/<roman month>/<year>` for the month of `at`
pub fn format_document_number(
    sequence: u32,
    prefix: &str,
    kind: OrderKind,
    at: DateTime<Utc>,
) -> String {
    let month = to_roman(at.month()).unwrap_or("I");
    format!(
        "{:04}/{}/{}/{}/{}",
        sequence,
        prefix,
        kind.document_code(),
        month,
        at.year()
    )
}

/// Next document number given the numbers already issued this month
pub fn next_document_number<'a, I>(
    existing: I,
    prefix: &str,
    kind: OrderKind,
    at: DateTime<Utc>,
) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let last = existing
        .into_iter()
        .filter_map(parse_sequence)
        .max()
        .unwrap_or(0);
    format_document_number(last + 1, prefix, kind, at)
}

/// Half-open `[start, end)` range covering the calendar month of `at`
pub fn month_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(at.year(), at.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(at);
    let end = start.checked_add_months(Months::new(1)).unwrap_or(start);
    (start, end)
}
