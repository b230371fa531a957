//! Timestamped text format (`# 3`)
//!
//! Same records as `txt`, preceded by the save time in milliseconds since
//! the Unix epoch:
//!
//! ```text
//! # 3
//! @time 1760650000000
//! file:/work/classes/Foo.class 8127346512
//! ```

use std::io::{BufRead, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use super::Lines;
use crate::mode::Mode;
use crate::regdata::RegDataSet;
use crate::Result;

const TIME_TAG: &str = "@time ";

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn write<W: Write>(writer: &mut W, records: &RegDataSet) -> Result<()> {
    write_at(writer, records, now_millis())
}

/// Write with an explicit save time.
pub fn write_at<W: Write>(writer: &mut W, records: &RegDataSet, millis: u64) -> Result<()> {
    writeln!(writer, "{}", Mode::TimeTxt.magic())?;
    writeln!(writer, "{}{}", TIME_TAG, millis)?;
    super::write_record_lines(writer, records)
}

fn read_time<R: BufRead>(lines: &mut Lines<R>) -> Result<u64> {
    lines.expect_header()?;
    let line = lines
        .next_line()?
        .ok_or_else(|| lines.error("missing `@time` line"))?;
    let millis = line
        .strip_prefix(TIME_TAG)
        .ok_or_else(|| lines.error("expected `@time <millis>`"))?;
    millis
        .parse()
        .map_err(|_| lines.error(format!("bad timestamp {:?}", millis)))
}

pub fn read<R: BufRead>(reader: R) -> Result<RegDataSet> {
    let mut lines = Lines::new(reader, Mode::TimeTxt);
    read_time(&mut lines)?;
    super::read_record_lines(&mut lines)
}

/// Save time recorded in a `time_txt` stream, in ms since the epoch.
pub fn saved_at<R: BufRead>(reader: R) -> Result<u64> {
    let mut lines = Lines::new(reader, Mode::TimeTxt);
    read_time(&mut lines)
}
