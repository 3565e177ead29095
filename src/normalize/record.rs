//! Row normalization: raw delimited text into validated bookings.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

use crate::error::{DateField, ParseError};
use crate::normalize::dates::{canonicalize_date, format_canonical, DateError};

/// Rows shorter than this carry no date columns and skip date validation.
const DATED_ROW_MIN_FIELDS: usize = 3;

/// One normalized booking row.
///
/// Column 0 is the property key, columns 1 and 2 hold canonical
/// `YYYY-MM-DD` check-in/check-out dates when the row has them. Every other
/// column is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    fields: Vec<String>,
    check_in: Option<NaiveDate>,
}

impl Booking {
    /// The property this booking belongs to.
    pub fn property_key(&self) -> &str {
        // Construction guarantees a non-empty column 0.
        &self.fields[0]
    }

    /// Parsed check-in date, `None` for rows without date columns.
    pub fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Normalizes one comma-delimited line.
///
/// `row` is only used to locate errors; callers pass the 1-based line
/// number of the source document.
pub fn normalize(raw_line: &str, row: u64) -> Result<Booking, ParseError> {
    normalize_with_delimiter(raw_line, row, b',')
}

/// Normalizes one line split on `delimiter`.
///
/// Splitting is quote-aware, so a quoted payload column containing the
/// delimiter stays a single field. Text holding a second record is rejected
/// with `MultipleRecords`.
pub fn normalize_with_delimiter(
    raw_line: &str,
    row: u64,
    delimiter: u8,
) -> Result<Booking, ParseError> {
    normalize_fields(split_line(raw_line, row, delimiter)?, row)
}

/// Normalizes an already-split row.
pub fn normalize_fields(mut fields: Vec<String>, row: u64) -> Result<Booking, ParseError> {
    let has_key = fields.first().is_some_and(|key| !key.trim().is_empty());
    if !has_key {
        return Err(ParseError::missing_property_key(row));
    }

    if fields.len() < DATED_ROW_MIN_FIELDS {
        return Ok(Booking {
            fields,
            check_in: None,
        });
    }

    let mut check_in = None;
    for field in [DateField::CheckIn, DateField::CheckOut] {
        let slot = &mut fields[field.index()];
        let date = canonicalize_date(slot).map_err(|e| match e {
            DateError::Empty => ParseError::empty_date(row, field),
            DateError::Unrecognized(_) => ParseError::invalid_date(row, field, slot.as_str()),
        })?;
        *slot = format_canonical(date);
        if field == DateField::CheckIn {
            check_in = Some(date);
        }
    }

    Ok(Booking { fields, check_in })
}

/// Converts a record read by a streaming CSV reader.
pub fn normalize_record(record: &StringRecord, row: u64) -> Result<Booking, ParseError> {
    normalize_fields(record.iter().map(String::from).collect(), row)
}

fn split_line(raw_line: &str, row: u64, delimiter: u8) -> Result<Vec<String>, ParseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(raw_line.as_bytes());

    let mut record = StringRecord::new();
    let fields: Vec<String> = match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(String::from).collect(),
        Ok(false) => return Ok(Vec::new()),
        // A `&str` is always valid UTF-8 and the reader is flexible, so this
        // arm is only a fallback.
        Err(_) => {
            return Ok(raw_line
                .split(char::from(delimiter))
                .map(String::from)
                .collect())
        }
    };

    // Trailing line breaks end the record; anything else is another row.
    match reader.read_record(&mut record) {
        Ok(false) => Ok(fields),
        Ok(true) | Err(_) => Err(ParseError::multiple_records(row)),
    }
}
