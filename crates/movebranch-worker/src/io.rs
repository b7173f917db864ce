//! Record stream reading plus line and CSV writers.

use std::io::{BufRead, Write};

use movebranch_core::{comparison_header, ComparisonRow, RecordError, RECORD_TERMINATOR};

use crate::error::WorkerError;

/// Read one record's lines, up to and excluding the terminator line.
///
/// Returns `None` once the input holds nothing but blank lines. A final
/// record without a terminator is still returned.
///
/// A record with a line that is not valid UTF-8 is consumed up to its
/// terminator and reported as a [`RecordError::MalformedLine`], so the
/// reader is left at the start of the next record.
pub fn read_record_lines<R: BufRead>(reader: &mut R) -> Result<Option<Vec<String>>, WorkerError> {
    let mut lines = Vec::new();
    let mut undecodable = None;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\n', '\r']);
        if line.trim_end() == RECORD_TERMINATOR {
            if lines.is_empty() {
                continue;
            }
            break;
        }
        if lines.is_empty() && line.trim().is_empty() {
            continue;
        }
        if undecodable.is_none() && std::str::from_utf8(&buf).is_err() {
            undecodable = Some(line.to_string());
        }
        lines.push(line.to_string());
    }

    if let Some(line) = undecodable {
        return Err(RecordError::MalformedLine {
            line,
            reason: "not valid UTF-8",
        }
        .into());
    }
    Ok((!lines.is_empty()).then_some(lines))
}

/// Write record lines followed by the terminator.
pub fn write_record_lines<W: Write>(writer: &mut W, lines: &[String]) -> Result<(), WorkerError> {
    for line in lines {
        writeln!(writer, "{line}")?;
    }
    writeln!(writer, "{RECORD_TERMINATOR}")?;
    Ok(())
}

/// CSV output of comparison rows. The header goes out once, on creation.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W) -> Result<Self, WorkerError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(comparison_header())?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_rows(&mut self, rows: &[ComparisonRow]) -> Result<(), WorkerError> {
        for row in rows {
            self.writer.write_record(row.to_fields())?;
        }
        self.rows += rows.len();
        Ok(())
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<(), WorkerError> {
        self.writer.flush()?;
        Ok(())
    }
}
