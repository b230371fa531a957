//! Binary format (`# 2`)
//!
//! Layout after the 3 magic bytes, all integers big endian:
//! `count: u32`, then `count` times `url_len: u32, url, hash_len: u32, hash`.

use std::io::{self, BufRead, Read, Write};

use super::malformed;
use crate::mode::Mode;
use crate::regdata::{self, RegData, RegDataSet};
use crate::{Error, Result};

fn write_str<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| malformed(Mode::Bin, "string longer than u32::MAX bytes"))?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

pub fn write<W: Write>(writer: &mut W, records: &RegDataSet) -> Result<()> {
    writer.write_all(Mode::Bin.magic().as_bytes())?;
    let count = u32::try_from(records.len())
        .map_err(|_| malformed(Mode::Bin, "more than u32::MAX records"))?;
    writer.write_all(&count.to_be_bytes())?;
    for record in regdata::sorted(records) {
        write_str(writer, record.url())?;
        write_str(writer, record.hash())?;
    }
    Ok(())
}

fn truncated(err: io::Error, what: &str) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        malformed(Mode::Bin, format!("truncated while reading {}", what))
    } else {
        err.into()
    }
}

fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| truncated(e, what))?;
    Ok(u32::from_be_bytes(buf))
}

fn read_str<R: Read>(reader: &mut R, what: &str) -> Result<String> {
    let len = read_u32(reader, what)? as u64;
    // Bounded read: a corrupt length must not drive the allocation.
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(malformed(Mode::Bin, format!("truncated while reading {}", what)));
    }
    String::from_utf8(buf).map_err(|_| malformed(Mode::Bin, format!("{} is not valid UTF-8", what)))
}

pub fn read<R: BufRead>(mut reader: R) -> Result<RegDataSet> {
    let magic = Mode::Bin.magic().as_bytes();
    let mut header = vec![0u8; magic.len()];
    reader
        .read_exact(&mut header)
        .map_err(|e| truncated(e, "header"))?;
    if header != magic {
        return Err(malformed(Mode::Bin, format!("unexpected header {:?}", header)));
    }

    let count = read_u32(&mut reader, "record count")?;
    let mut records = RegDataSet::new();
    for _ in 0..count {
        let url = read_str(&mut reader, "url")?;
        let hash = read_str(&mut reader, "hash")?;
        records.insert(RegData::new(url, hash));
    }

    if !reader.fill_buf()?.is_empty() {
        return Err(malformed(Mode::Bin, "trailing bytes after last record"));
    }
    Ok(records)
}
