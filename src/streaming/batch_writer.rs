//! Batch serialization and the output sink seam.
//!
//! A job never touches the filesystem directly: each finished batch is
//! rendered to CSV bytes and handed to a [`BatchSink`] under its file name.

use csv::{Terminator, WriterBuilder};

use crate::batching::Batch;
use crate::error::AppError;

/// Destination for named batch files.
pub trait BatchSink {
    /// Stores one complete file. Names are unique within a job.
    fn put(&mut self, name: &str, contents: &[u8]) -> Result<(), AppError>;
}

/// Collects batch files in memory, in the order they were produced.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[(String, Vec<u8>)] {
        &self.files
    }
}

impl BatchSink for MemorySink {
    fn put(&mut self, name: &str, contents: &[u8]) -> Result<(), AppError> {
        if self.files.iter().any(|(existing, _)| existing == name) {
            return Err(AppError::Sink(format!("duplicate output name: {}", name)));
        }
        self.files.push((name.to_string(), contents.to_vec()));
        Ok(())
    }
}

/// Serializes a batch as delimited text: the shared header, then one line
/// per booking, CRLF-terminated.
///
/// Rows keep their own field count, so short rows are written short.
pub fn render_batch_csv(
    header: &[String],
    batch: &Batch,
    delimiter: u8,
) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::with_capacity((batch.len() + 1) * 64);
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .terminator(Terminator::CRLF)
            .from_writer(&mut buf);

        writer
            .write_record(header)
            .map_err(|e| AppError::CsvInvalid(format!("Failed to write header: {}", e)))?;

        for booking in batch.bookings() {
            writer.write_record(booking.fields()).map_err(|e| {
                AppError::CsvInvalid(format!("Failed to serialize booking: {}", e))
            })?;
        }

        writer
            .flush()
            .map_err(|e| AppError::Internal(format!("Failed to flush writer: {}", e)))?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batching::partition;
    use crate::normalize::normalize;

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    /// Parses rendered bytes back into header + rows.
    fn parse(bytes: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);
        let headers = reader
            .headers()
            .expect("Failed to read headers")
            .iter()
            .map(String::from)
            .collect();
        let rows = reader
            .records()
            .map(|r| {
                r.expect("Failed to read record")
                    .iter()
                    .map(String::from)
                    .collect()
            })
            .collect();
        (headers, rows)
    }

    #[test]
    fn test_render_includes_header_and_rows() {
        let bookings = vec![
            normalize("P1,11/12/2025,2025-12-14,\"Smith, Jane\"", 2).unwrap(),
            normalize("P2,2025-12-01,2025-12-03,Lee", 3).unwrap(),
        ];
        let batches = partition(bookings, 10, 2);
        let bytes = render_batch_csv(
            &header(&["property", "check_in", "check_out", "guest"]),
            &batches[0],
            b',',
        )
        .expect("render failed");

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("property,check_in,check_out,guest\r\n"));
        assert!(text.contains("\r\n"), "Batch files should use CRLF terminators");

        let (headers, rows) = parse(&bytes);
        assert_eq!(headers, vec!["property", "check_in", "check_out", "guest"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["P1", "2025-12-11", "2025-12-14", "Smith, Jane"]);
        assert_eq!(rows[1][0], "P2");
    }

    #[test]
    fn test_render_keeps_short_rows_short() {
        let bookings = vec![normalize("P1", 2).unwrap()];
        let batches = partition(bookings, 10, 2);
        let bytes = render_batch_csv(&header(&["property", "check_in", "check_out"]), &batches[0], b',')
            .expect("render failed");
        let (_, rows) = parse(&bytes);
        assert_eq!(rows, vec![vec!["P1".to_string()]]);
    }

    #[test]
    fn test_render_with_custom_delimiter() {
        let bookings = vec![normalize("P1,2025-01-01,2025-01-02", 2).unwrap()];
        let batches = partition(bookings, 10, 2);
        let bytes = render_batch_csv(&header(&["a", "b", "c"]), &batches[0], b';')
            .expect("render failed");
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "a;b;c\r\nP1;2025-01-01;2025-01-02\r\n"
        );
    }

    #[test]
    fn test_memory_sink_keeps_order_and_rejects_duplicates() {
        let mut sink = MemorySink::new();
        sink.put("b.csv", b"2").unwrap();
        sink.put("a.csv", b"1").unwrap();
        assert!(matches!(sink.put("a.csv", b"again"), Err(AppError::Sink(_))));

        let names: Vec<&str> = sink.files().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b.csv", "a.csv"]);
    }
}
