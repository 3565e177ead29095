use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which date column of a booking row a parse error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    CheckIn,
    CheckOut,
}

impl DateField {
    /// Column index of this field within a booking row.
    pub fn index(self) -> usize {
        match self {
            DateField::CheckIn => 1,
            DateField::CheckOut => 2,
        }
    }

    /// Human-readable column name used in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            DateField::CheckIn => "check-in",
            DateField::CheckOut => "check-out",
        }
    }
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of row-level normalization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseErrorKind {
    /// A date column is empty or whitespace-only.
    EmptyDate,
    /// A date column matches no accepted layout, or names an impossible day.
    InvalidDate,
    /// The row has no property key in column 0.
    MissingPropertyKey,
    /// A single-row input held more than one record.
    MultipleRecords,
}

/// A normalization failure, located precisely enough to fix the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based line number in the source document (the header is row 1).
    pub row: u64,
    /// Offending date column, `None` for row-shape errors.
    pub field: Option<DateField>,
    /// The raw value as it appeared in the input.
    pub raw_value: Option<String>,
}

impl ParseError {
    pub fn empty_date(row: u64, field: DateField) -> Self {
        Self {
            kind: ParseErrorKind::EmptyDate,
            row,
            field: Some(field),
            raw_value: None,
        }
    }

    pub fn invalid_date(row: u64, field: DateField, raw_value: impl Into<String>) -> Self {
        Self {
            kind: ParseErrorKind::InvalidDate,
            row,
            field: Some(field),
            raw_value: Some(raw_value.into()),
        }
    }

    pub fn missing_property_key(row: u64) -> Self {
        Self {
            kind: ParseErrorKind::MissingPropertyKey,
            row,
            field: None,
            raw_value: None,
        }
    }

    pub fn multiple_records(row: u64) -> Self {
        Self {
            kind: ParseErrorKind::MultipleRecords,
            row,
            field: None,
            raw_value: None,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, self.field) {
            (ParseErrorKind::EmptyDate, Some(field)) => {
                write!(f, "row {}: {} date is empty", self.row, field)
            }
            (ParseErrorKind::InvalidDate, Some(field)) => write!(
                f,
                "row {}: {} date '{}' is not a valid date",
                self.row,
                field,
                self.raw_value.as_deref().unwrap_or("")
            ),
            (ParseErrorKind::MissingPropertyKey, _) => {
                write!(f, "row {}: missing property id", self.row)
            }
            (ParseErrorKind::MultipleRecords, _) => {
                write!(f, "row {}: line holds more than one record", self.row)
            }
            (kind, None) => write!(f, "row {}: {:?}", self.row, kind),
        }
    }
}

impl std::error::Error for ParseError {}

/// User-friendly error presentation for callers that surface errors to people.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Input ─────────────────────────────────────────────────────────────────
    #[error("Invalid booking row: {0}")]
    Parse(#[from] ParseError),

    #[error("File is not valid UTF-8")]
    NotUtf8,

    #[error("CSV file has no header row")]
    NoHeader,

    #[error("Invalid CSV: {0}")]
    CsvInvalid(String),

    // ── Configuration ─────────────────────────────────────────────────────────
    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),

    // ── Output ────────────────────────────────────────────────────────────────
    #[error("Failed to write batch: {0}")]
    Sink(String),

    // ── Internal ──────────────────────────────────────────────────────────────
    #[error("Batch constraint violated: {0}")]
    InvariantViolation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a presentation suitable for end users.
    /// Internal failures never expose their details.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            AppError::Parse(err) => {
                let title = match err.kind {
                    ParseErrorKind::EmptyDate => "Missing Date",
                    ParseErrorKind::InvalidDate => "Invalid Date",
                    ParseErrorKind::MissingPropertyKey => "Missing Property",
                    ParseErrorKind::MultipleRecords => "Malformed Row",
                };
                let action = match err.kind {
                    ParseErrorKind::MissingPropertyKey => {
                        "Fill in the property id in the first column"
                    }
                    ParseErrorKind::MultipleRecords => "Pass one booking row at a time",
                    _ => "Use YYYY-MM-DD, DD/MM/YYYY or MM/DD/YYYY dates",
                };
                ErrorPresentation {
                    title: title.into(),
                    message: err.to_string(),
                    action: Some(action.into()),
                }
            }

            AppError::NotUtf8 => ErrorPresentation {
                title: "Invalid File Encoding".into(),
                message: "The file must be UTF-8 encoded. Please re-save your file with UTF-8 encoding.".into(),
                action: Some("Convert file to UTF-8".into()),
            },

            AppError::NoHeader => ErrorPresentation {
                title: "Missing Header".into(),
                message: "The file has no header row on its first line.".into(),
                action: Some("Put the header row on the first line and try again".into()),
            },

            AppError::CsvInvalid(msg) => ErrorPresentation {
                title: "Invalid CSV".into(),
                message: format!("The CSV file has a formatting problem: {}", msg),
                action: Some("Fix the CSV file and try again".into()),
            },

            AppError::InvalidConfig(msg) => ErrorPresentation {
                title: "Invalid Settings".into(),
                message: format!("The batch settings are not usable: {}", msg),
                action: Some("Adjust the batch limits".into()),
            },

            AppError::Sink(_) => ErrorPresentation {
                title: "Output Failed".into(),
                message: "The batch files could not be written.".into(),
                action: Some("Check available disk space and permissions".into()),
            },

            AppError::InvariantViolation(_) | AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}
