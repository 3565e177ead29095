//! Booking row normalization.
//!
//! Turns raw delimited rows into [`Booking`] values whose check-in and
//! check-out columns are guaranteed to be canonical `YYYY-MM-DD` dates, so
//! nothing downstream ever has to deal with the layouts found in exports.

mod dates;
mod record;

pub use dates::{canonicalize_date, format_canonical, DateError, CANONICAL_DATE_FORMAT};
pub use record::{normalize, normalize_fields, normalize_record, normalize_with_delimiter, Booking};
