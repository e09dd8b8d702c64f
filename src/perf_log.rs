use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::{ByteRecord, ReaderBuilder, Terminator};
use log::debug;

use crate::error::Error;
use crate::perf::Measurement;

const FIELDS_PER_RECORD: usize = 3;

/// The log writer leaves stray control bytes (1..=31) next to the duration value.
fn is_stray_control(c: char) -> bool {
    ('\u{1}'..='\u{1f}').contains(&c)
}

fn strip_control(field: &str) -> String {
    field.chars().filter(|&c| !is_stray_control(c)).collect()
}

fn malformed(line: u64, raw: &str, reason: impl Into<String>) -> Error {
    Error::MalformedRecord {
        line,
        content: raw.to_string(),
        reason: reason.into(),
    }
}

fn parse_field<T: FromStr>(line: u64, raw: &str, name: &str, value: &str) -> Result<T, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| malformed(line, raw, format!("{name} is not a base-10 integer")))
}

fn parse_count(line: u64, raw: &str, name: &str, value: &str) -> Result<u32, Error> {
    let count: u32 = parse_field(line, raw, name, value)?;
    if count == 0 {
        return Err(malformed(line, raw, format!("{name} must be at least 1")));
    }
    Ok(count)
}

fn parse_fields(line: u64, raw: &str, fields: &[&str]) -> Result<Measurement, Error> {
    if fields.len() < FIELDS_PER_RECORD {
        return Err(malformed(
            line,
            raw,
            format!("expected {FIELDS_PER_RECORD} fields, found {}", fields.len()),
        ));
    }

    let thread_count = parse_count(line, raw, "thread count", fields[0])?;
    let work_count = parse_count(line, raw, "work count", fields[1])?;
    let duration_ns = parse_field(line, raw, "duration", &strip_control(fields[2]))?;

    Ok(Measurement::new(thread_count, work_count, duration_ns))
}

/// Parses one `threads,work,duration` line. `line` is 1-based and only used for errors.
/// Fields past the third are ignored.
pub fn parse_line(line: u64, raw: &str) -> Result<Measurement, Error> {
    let fields: Vec<&str> = raw.split(',').collect();
    parse_fields(line, raw, &fields)
}

/// Parses in-memory log lines, numbering them from 1. Blank lines are skipped.
pub fn parse_lines<'a, I>(lines: I) -> Result<Vec<Measurement>, Error>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut measurements = Vec::new();
    for (i, raw) in lines.into_iter().enumerate() {
        if raw.trim_end_matches(|c: char| c == '\r' || c == '\n').is_empty() {
            continue;
        }
        measurements.push(parse_line(i as u64 + 1, raw)?);
    }
    Ok(measurements)
}

fn record_to_measurement(record: &ByteRecord) -> Result<Measurement, Error> {
    let line = record.position().map_or(0, |p| p.line());
    let raw = record
        .iter()
        .map(String::from_utf8_lossy)
        .collect::<Vec<_>>()
        .join(",");

    let mut fields = Vec::with_capacity(record.len());
    for field in record.iter() {
        let field = std::str::from_utf8(field).map_err(|_| malformed(line, &raw, "invalid UTF-8"))?;
        fields.push(field);
    }

    parse_fields(line, &raw, &fields)
}

/// A CRLF blank line leaves a lone `\r` behind once `\n` ends the record.
fn is_blank(record: &ByteRecord) -> bool {
    record.len() == 1 && record[0].iter().all(|&b| b == b'\r')
}

fn read_error(path: &Path, err: csv::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source: err.into(),
    }
}

/// Reads a whole measurement log. The file is closed when the reader drops,
/// whether or not parsing succeeded. Only `\n` ends a record, so a `\r` inside
/// the duration is stripped like any other control byte.
pub fn read_measurements<P: AsRef<Path>>(path: P) -> Result<Vec<Measurement>, Error> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| read_error(path, e))?;

    let mut measurements = Vec::new();
    let mut record = ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .map_err(|e| read_error(path, e))?
    {
        if is_blank(&record) {
            continue;
        }
        measurements.push(record_to_measurement(&record)?);
    }

    debug!("read {} measurements from {}", measurements.len(), path.display());
    Ok(measurements)
}

/// Reads a measurement log piped on stdin.
pub fn read_stdin() -> Result<Vec<Measurement>, Error> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .map_err(|source| Error::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    parse_lines(text.lines())
}
