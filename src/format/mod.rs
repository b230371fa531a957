//! Format strategies - serialization of a dependency set per storage mode
//!
//! Writers emit the mode's magic sequence first, then the payload. Readers
//! check the magic sequence and parse only what their own writer produced;
//! reading a file written in another mode is a format error.

pub mod bin;
pub mod prefix_txt;
pub mod time_txt;
pub mod txt;

use std::borrow::Cow;
use std::io::{self, BufRead, Write};

use crate::mode::Mode;
use crate::regdata::{self, RegData, RegDataSet};
use crate::{Error, Result};

impl Mode {
    /// Write `records` to `writer` in this mode's layout.
    pub fn serialize<W: Write>(&self, writer: &mut W, records: &RegDataSet) -> Result<()> {
        match self {
            Mode::Txt => txt::write(writer, records),
            Mode::PrefixTxt => prefix_txt::write(writer, records),
            Mode::Bin => bin::write(writer, records),
            Mode::TimeTxt => time_txt::write(writer, records),
        }
    }

    /// Parse a stream previously written by [`Mode::serialize`].
    pub fn deserialize<R: BufRead>(&self, reader: R) -> Result<RegDataSet> {
        match self {
            Mode::Txt => txt::read(reader),
            Mode::PrefixTxt => prefix_txt::read(reader),
            Mode::Bin => bin::read(reader),
            Mode::TimeTxt => time_txt::read(reader),
        }
    }
}

pub(crate) fn malformed(mode: Mode, reason: impl Into<String>) -> Error {
    Error::Format {
        mode,
        reason: reason.into(),
    }
}

/// Line reader shared by the text formats.
///
/// Invalid UTF-8 is reported as a format error rather than an I/O error.
pub(crate) struct Lines<R> {
    inner: io::Lines<R>,
    mode: Mode,
    line_no: usize,
}

impl<R: BufRead> Lines<R> {
    pub(crate) fn new(reader: R, mode: Mode) -> Self {
        Self {
            inner: reader.lines(),
            mode,
            line_no: 0,
        }
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<String>> {
        match self.inner.next() {
            None => Ok(None),
            Some(Ok(line)) => {
                self.line_no += 1;
                Ok(Some(line.trim_end_matches('\r').to_string()))
            }
            Some(Err(e)) if e.kind() == io::ErrorKind::InvalidData => Err(malformed(
                self.mode,
                format!("line {} is not valid UTF-8", self.line_no + 1),
            )),
            Some(Err(e)) => Err(e.into()),
        }
    }

    /// Consume the first line and check it against the magic sequence.
    pub(crate) fn expect_header(&mut self) -> Result<()> {
        match self.next_line()? {
            Some(line) if line == self.mode.magic() => Ok(()),
            Some(line) => Err(malformed(
                self.mode,
                format!("expected header {:?}, found {:?}", self.mode.magic(), line),
            )),
            None => Err(malformed(self.mode, "empty stream, missing header")),
        }
    }

    pub(crate) fn error(&self, reason: impl std::fmt::Display) -> Error {
        malformed(self.mode, format!("line {}: {}", self.line_no, reason))
    }

    /// Unescape one field, reporting bad escapes against the current line.
    pub(crate) fn field<'a>(&self, raw: &'a str) -> Result<Cow<'a, str>> {
        unescape(raw).ok_or_else(|| self.error(format!("bad escape in {:?}", raw)))
    }
}

/// Escape a field for the text formats.
///
/// Fields are separated by single spaces and records by newlines. A
/// backslash is written as `\\\\`, a space as `\\s`, and line breaks as `\\n`
/// and `\\r`.
pub(crate) fn escape(field: &str) -> Cow<'_, str> {
    if !field.contains(['\\', ' ', '\n', '\r']) {
        return Cow::Borrowed(field);
    }
    let mut escaped = String::with_capacity(field.len() + 8);
    for c in field.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ' ' => escaped.push_str("\\s"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Inverse of [`escape`]. `None` on a dangling or unknown escape.
pub(crate) fn unescape(field: &str) -> Option<Cow<'_, str>> {
    if !field.contains('\\') {
        return Some(Cow::Borrowed(field));
    }
    let mut plain = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            plain.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => plain.push('\\'),
            's' => plain.push(' '),
            'n' => plain.push('\n'),
            'r' => plain.push('\r'),
            _ => return None,
        }
    }
    Some(Cow::Owned(plain))
}

/// `<url> <hash>` lines in stable order, fields escaped.
pub(crate) fn write_record_lines<W: Write>(writer: &mut W, records: &RegDataSet) -> Result<()> {
    for record in regdata::sorted(records) {
        writeln!(writer, "{} {}", escape(record.url()), escape(record.hash()))?;
    }
    Ok(())
}

/// Parse the remaining `<url> <hash>` lines.
pub(crate) fn read_record_lines<R: BufRead>(lines: &mut Lines<R>) -> Result<RegDataSet> {
    let mut records = RegDataSet::new();
    while let Some(line) = lines.next_line()? {
        if line.is_empty() {
            continue;
        }
        let (url, hash) = line
            .split_once(' ')
            .filter(|(_, hash)| !hash.contains(' '))
            .ok_or_else(|| lines.error("expected `<url> <hash>`"))?;
        records.insert(RegData::new(lines.field(url)?, lines.field(hash)?));
    }
    Ok(records)
}
